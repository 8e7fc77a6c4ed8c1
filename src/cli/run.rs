use super::Context;
use agora::events::{EventBus, EventPublisher, EventStream};
use agora::ledger::GovernanceLedger;
use agora::events::LedgerEvent;
use agora::rpc::{handle_line, render, render_event, Response};
use agora::store::{FileJournal, LedgerStore};
use futures::{FutureExt, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

/// Run the ledger as a JSON-lines service on stdin/stdout
///
/// Each input line is one request and gets exactly one response line.
/// Committed events are written as `{"event": ...}` lines after the
/// response of the request that caused them. Logs go to stderr so stdout
/// stays machine-readable.
pub async fn execute(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let bus = EventBus::new(ctx.config.events.channel_capacity);
    let mut events = bus.subscribe();

    let journal = FileJournal::open(&ctx.journal_path).await?;
    let ledger = GovernanceLedger::open(journal, bus).await?;

    info!(
        config = %ctx.config_path.display(),
        journal = %ctx.journal_path.display(),
        proposals = ledger.proposals_count().await,
        "ledger service started"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(&ledger, &mut events, stdin, stdout).await?;

    info!("input closed; ledger service stopped");
    Ok(())
}

/// Serve requests from `reader` until end of input.
///
/// Lines are read as raw bytes so one undecodable line gets a `BadRequest`
/// instead of ending the session.
pub async fn serve<S, P, R, W>(
    ledger: &GovernanceLedger<S, P>,
    events: &mut EventStream,
    mut reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    S: LedgerStore,
    P: EventPublisher,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // Partial reads stay in `buf` when the event branch wins the select.
    let mut buf = Vec::new();

    loop {
        tokio::select! {
            biased;

            Some(event) = events.next() => {
                write_event(&mut writer, &event).await?;
            }
            read = reader.read_until(b'\n', &mut buf) => {
                if read? == 0 && buf.is_empty() {
                    break;
                }
                let line = std::mem::take(&mut buf);
                let response = match std::str::from_utf8(&line) {
                    Ok(text) if text.trim().is_empty() => continue,
                    Ok(text) => handle_line(ledger, text.trim_end()).await,
                    Err(_) => render(&Response::bad_request("request is not valid UTF-8")),
                };
                write_line(&mut writer, &response).await?;
            }
        }
    }

    // Events from the last requests are already in the channel.
    while let Some(Some(event)) = events.next().now_or_never() {
        write_event(&mut writer, &event).await?;
    }
    writer.flush().await
}

async fn write_event<W: AsyncWrite + Unpin>(
    writer: &mut W,
    event: &LedgerEvent,
) -> std::io::Result<()> {
    match render_event(event) {
        Some(line) => write_line(writer, &line).await,
        None => Ok(()),
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
