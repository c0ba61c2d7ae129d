use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures_util::StreamExt;
use lumen_data::{ByteStream, DataFetcher, oneshot_callback};
use lumen_http::{HttpClient, ImageUrl, ReqwestTransport, TransportOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::runtime::Handle;
use tracing::info;

use crate::cli::FetchArgs;

pub async fn run(args: FetchArgs) -> Result<()> {
    let options =
        TransportOptions::default().request_timeout(Some(Duration::from_secs(args.timeout)));
    let transport =
        ReqwestTransport::with_options(&options).context("failed to build HTTP transport")?;
    let mut client = HttpClient::new(transport, Handle::current());
    if let Some(user_agent) = args.user_agent {
        client = client.with_user_agent(user_agent);
    }

    let mut url = ImageUrl::new(args.url)?;
    for (name, value) in args.headers {
        url = url.with_header(name, value);
    }

    let fetcher = client.fetcher(url);
    let (callback, rx) = oneshot_callback::<ByteStream>();
    fetcher.load_data(args.priority.into(), Box::new(callback));

    let outcome = rx.await.context("fetch finished without an outcome")?;
    let result = match outcome {
        Ok(Some(stream)) => write_output(stream, args.output.as_deref()).await,
        Ok(None) => Err(anyhow!("{} returned no data", fetcher.url())),
        Err(e) => Err(e).with_context(|| format!("failed to fetch {}", fetcher.url())),
    };
    fetcher.cleanup();

    let written = result?;
    info!(url = %fetcher.url(), bytes = written, source = %fetcher.data_source(), "fetched");
    Ok(())
}

async fn write_output(stream: ByteStream, output: Option<&Path>) -> Result<u64> {
    match output {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("failed to create {}", path.display()))?;
            copy(stream, file).await
        }
        None => copy(stream, tokio::io::stdout()).await,
    }
}

async fn copy<W: AsyncWrite + Unpin>(mut stream: ByteStream, mut out: W) -> Result<u64> {
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("failed to read response body")?;
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    out.flush().await?;
    Ok(written)
}
