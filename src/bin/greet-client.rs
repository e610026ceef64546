use anyhow::Context;
use greet_http::client::{self, Rendered, Target};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut stdin = BufReader::new(tokio::io::stdin());
    let raw_url = prompt(&mut stdin, "input the url: ").await?;
    let data_type = prompt(&mut stdin, "input the data type: ").await?;

    let media = match client::parse_media_type(&data_type) {
        Ok(media) => media,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };
    let target = match Target::parse(&raw_url) {
        Ok(target) => target,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    let response = client::fetch(&target, media).await?;
    println!("STATUS: {}", response.status_line());

    match client::render_body(&response).context("invalid response body")? {
        Rendered::Lines(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        Rendered::Raw(body) => println!("{}", body),
    }
    Ok(())
}

async fn prompt(stdin: &mut BufReader<Stdin>, question: &str) -> anyhow::Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(question.as_bytes()).await?;
    stdout.flush().await?;
    let mut line = String::new();
    stdin.read_line(&mut line).await?;
    Ok(line.trim().to_owned())
}
