//! I1 (row monotonicity) and I2 (chunk independence): feeding an input as
//! a sequence of arbitrarily-sized chunks through the streaming driver must
//! reproduce the exact row sequence a single-shot parse produces, and the
//! rows observed after any prefix of feeds must themselves be a prefix of
//! the final output.

use proptest::prelude::*;

use ocsv::streaming::StreamingParser;
use ocsv::{Config, ErrorInfo, Parser};

fn valid_csv_field() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,8}"
}

fn valid_csv_row(max_fields: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(valid_csv_field(), 1..=max_fields)
}

/// A well-formed CSV document: plain fields, no quoting needed, so every
/// chunk split point is unambiguous and no driver can raise an error.
fn valid_csv_document() -> impl Strategy<Value = (String, Vec<Vec<String>>)> {
    prop::collection::vec(valid_csv_row(5), 0..12).prop_map(|rows| {
        let mut text = String::new();
        for row in &rows {
            text.push_str(&row.join(","));
            text.push('\n');
        }
        (text, rows)
    })
}

fn feed_in_chunks(input: &[u8], chunk_size: usize) -> Vec<Vec<String>> {
    let mut driver = StreamingParser::new(Config::default()).unwrap();
    let mut collected = Vec::new();
    let mut on_row = |row: &[String], _num: i64| {
        collected.push(row.to_vec());
        true
    };
    let mut on_error = |_err: &ErrorInfo, _num: i64| true;

    for chunk in input.chunks(chunk_size.max(1)) {
        let _ = driver.feed(chunk, &mut on_row, &mut on_error);
    }
    let _ = driver.end(&mut on_row, &mut on_error);
    collected
}

proptest! {
    #[test]
    fn chunked_streaming_matches_single_shot_at_every_chunk_size(
        (text, expected) in valid_csv_document(),
        chunk_size in 1usize..=64,
    ) {
        let mut parser = Parser::new(Config::default()).unwrap();
        parser.parse(text.as_bytes()).unwrap();
        prop_assert_eq!(parser.into_rows(), expected.clone());

        let got = feed_in_chunks(text.as_bytes(), chunk_size);
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn one_byte_at_a_time_matches_single_shot(
        (text, expected) in valid_csv_document(),
    ) {
        let got = feed_in_chunks(text.as_bytes(), 1);
        prop_assert_eq!(got, expected);
    }
}

#[test]
fn sixteen_byte_chunks_on_quoted_multiline_input_match_single_shot() {
    let input = b"name,bio\n\"Alice\",\"multi\nline\nbio, with, commas\"\nBob,\"plain\"\n".to_vec();

    let mut parser = Parser::new(Config::default()).unwrap();
    parser.parse(&input).unwrap();
    let expected = parser.into_rows();

    for chunk_size in [1usize, 2, 3, 7, 16, 32] {
        let got = feed_in_chunks(&input, chunk_size);
        assert_eq!(got, expected, "diverged at chunk_size={chunk_size}");
    }
}

#[test]
fn row_sequence_observed_mid_stream_is_a_prefix_of_the_final_sequence() {
    let input = b"a,b\nc,d\ne,f\ng,h\n".to_vec();
    let mut driver = StreamingParser::new(Config::default()).unwrap();
    let mut all_seen: Vec<Vec<String>> = Vec::new();
    let mut snapshots: Vec<Vec<Vec<String>>> = Vec::new();

    for chunk in input.chunks(3) {
        let mut on_row = |row: &[String], _num: i64| {
            all_seen.push(row.to_vec());
            true
        };
        let mut on_error = |_err: &ErrorInfo, _num: i64| true;
        let _ = driver.feed(chunk, &mut on_row, &mut on_error);
        snapshots.push(all_seen.clone());
    }

    let final_rows = all_seen.clone();
    for snapshot in &snapshots {
        assert!(final_rows.starts_with(snapshot));
    }
}
