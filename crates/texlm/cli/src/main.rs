use colored::Colorize;

#[tokio::main]
async fn main() {
    if let Err(e) = texlm_cli::run().await {
        eprintln!("{} {}", "✗".red(), e);
        std::process::exit(1);
    }
}
