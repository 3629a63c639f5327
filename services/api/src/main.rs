use testwise_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("testwise: {err}");
        std::process::exit(1);
    }
}
