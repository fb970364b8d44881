//! Transcript partitioning.

/// Split a formatted transcript into chunks of at most `max_chars` characters.
///
/// Chunks break on line boundaries. A single line longer than `max_chars` is
/// split on character boundaries.
pub fn chunk_transcript(transcript: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in transcript.split_inclusive('\n') {
        let line_chars = line.chars().count();

        if line_chars > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if current_chars + line_chars > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_transcript_is_one_chunk() {
        let chunks = chunk_transcript("[0.00s → 1.00s] hi\n", 100);
        assert_eq!(chunks, vec!["[0.00s → 1.00s] hi\n"]);
    }

    #[test]
    fn test_empty_transcript_has_no_chunks() {
        assert!(chunk_transcript("", 100).is_empty());
    }

    #[test]
    fn test_splits_on_line_boundaries() {
        let line = format!("{}\n", "x".repeat(99));
        let transcript = line.repeat(450);
        let chunks = chunk_transcript(&transcript, 30_000);

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 30_000));
        assert!(chunks.iter().all(|c| c.ends_with('\n')));
        assert_eq!(chunks.concat(), transcript);
    }

    #[test]
    fn test_overlong_line_is_hard_split() {
        let transcript = format!("short\n{}\ntail\n", "y".repeat(25));
        let chunks = chunk_transcript(&transcript, 10);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), transcript);
    }
}
