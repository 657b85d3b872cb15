#[tokio::main]
async fn main() {
    community_data::start_server().await;
}
