use serenity::builder::CreateMessage;
use serenity::http::Http;
use serenity::model::id::{ChannelId, MessageId};

/// Characters per outgoing message, under the platform cap of 2000.
const CHUNK_MAX: usize = 1950;

/// Break `text` into pieces of at most [`CHUNK_MAX`] characters, cutting at the
/// last newline or space inside each window when there is one.
pub fn split_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    // Byte offset of the first char past the limit; never splits a code point.
    while let Some((limit, _)) = remaining.char_indices().nth(CHUNK_MAX) {
        let window = &remaining[..limit];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    if !remaining.is_empty() || chunks.is_empty() {
        chunks.push(remaining.to_string());
    }

    chunks
}

/// Send `text` in ≤1950-char chunks. With `reply_to`, the first chunk
/// references that message. Returns the id of the first message sent.
pub async fn send_chunked(
    http: &Http,
    channel_id: ChannelId,
    text: &str,
    reply_to: Option<MessageId>,
) -> Result<MessageId, serenity::Error> {
    let mut chunks = split_chunks(text).into_iter();

    let mut builder = CreateMessage::new().content(chunks.next().unwrap_or_default());
    if let Some(reply_to) = reply_to {
        builder = builder.reference_message((channel_id, reply_to));
    }
    let first = channel_id.send_message(http, builder).await?.id;

    for chunk in chunks {
        channel_id.say(http, chunk).await?;
    }
    Ok(first)
}
