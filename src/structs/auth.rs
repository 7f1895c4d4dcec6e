/// 由 Authorization header 取得的呼叫者身分
#[derive(Clone, Debug)]
pub struct CurrentWorker {
    pub id: String,
}
