use deskmate_core::types::DocumentChunk;

/// Split `text` left-to-right into pieces of at most `chunk_size` characters,
/// without overlap. The last piece may be shorter. Splits on `char`
/// boundaries, so multi-byte text is never cut mid-character.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    let mut chunks = Vec::with_capacity(text.len() / chunk_size + 1);
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(text[start..offset].to_string());
            start = offset;
            count = 0;
        }
        count += 1;
    }
    chunks.push(text[start..].to_string());
    chunks
}

pub fn into_document_chunks(pieces: Vec<String>) -> Vec<DocumentChunk> {
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| DocumentChunk {
            index,
            text,
            embedding: Vec::new(),
        })
        .collect()
}
