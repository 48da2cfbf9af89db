use anyhow::Result;
use clap::Parser;
use feedlift::config::Cli;
use feedlift::console::Terminal;
use feedlift::feed::AzureDevOpsFeed;
use feedlift::fetch::Fetcher;
use feedlift::http::HttpClient;
use feedlift::publish::NpmPublish;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config = Cli::parse().into_config()?;

    let client = reqwest::Client::builder().user_agent("feedlift").build()?;
    let http = HttpClient::new(client, config.source.token.clone());
    let feed = AzureDevOpsFeed::new(
        http.clone(),
        &config.source.org,
        &config.source.feed,
        config.feeds_url.clone(),
    );
    let fetcher = Fetcher::new(
        http,
        &config.source.org,
        &config.source.feed,
        config.ecosystem,
        config.workdir.clone(),
        config.pkgs_url.clone(),
    );

    feedlift::pipeline::run(&config, &feed, &fetcher, &Terminal, &NpmPublish).await?;
    Ok(())
}
