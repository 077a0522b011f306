//! Prebuilt graphs for common text and geo pipelines.
//!
//! Ready-made plans combining the built-in operators: word counting,
//! TF-IDF inverted indexes, per-document PMI ranking, and average road
//! speed bucketed by weekday and hour.

use crate::error::Result;
use crate::operators::{
    Count, Filter, FilterPunctuation, FirstReducer, HaversineMapper, InnerJoiner, LowerCase,
    MultiSum, PmiMapper, Project, Split, SpeedMapper, TermFrequency, TfIdfMapper,
    TimeProcessMapper, TopN,
};
use crate::row::Row;
use crate::value::Value;
use crate::Graph;

/// Counts words in `text_column` across all rows, ascending by count then
/// word.
pub fn word_count_graph(input: &str, text_column: &str, count_column: &str) -> Graph {
    Graph::from_iter(input)
        .map(FilterPunctuation::new(text_column))
        .map(LowerCase::new(text_column))
        .map(Split::new(text_column))
        .sort(&[text_column])
        .reduce(Count::new(count_column), &[text_column])
        .sort(&[count_column, text_column])
}

/// Ten most frequent words longer than seven characters, read from a file.
pub fn long_word_count_graph(
    path: &str,
    parser: impl Fn(&str) -> Result<Row> + 'static,
    text_column: &str,
    count_column: &str,
) -> Graph {
    let text = text_column.to_string();
    Graph::from_file(path, parser)
        .map(FilterPunctuation::new(text_column))
        .map(LowerCase::new(text_column))
        .map(Split::new(text_column))
        .sort(&[text_column])
        .reduce(Count::new(count_column), &[text_column])
        .sort(&[count_column, text_column])
        .map(Filter::new(move |row| word_longer_than(row, &text, 7)))
        .reduce(TopN::new(count_column, 10), &[])
}

/// TF-IDF for every word/document pair, keeping the top three documents per
/// word.
pub fn tf_idf_graph(
    input: &str,
    doc_column: &str,
    text_column: &str,
    result_column: &str,
) -> Graph {
    let words = Graph::from_iter(input)
        .map(FilterPunctuation::new(text_column))
        .map(LowerCase::new(text_column))
        .map(Split::new(text_column))
        .sort(&[doc_column, text_column]);

    let doc_count = Graph::from_iter(input)
        .sort(&[doc_column])
        .reduce(Count::new("docs_number"), &[]);

    let word_docs = words
        .reduce(FirstReducer, &[doc_column, text_column])
        .sort(&[text_column])
        .reduce(Count::new("words_number"), &[text_column]);

    words
        .reduce(TermFrequency::new(text_column, "tf"), &[doc_column])
        .sort(&[text_column])
        .join(InnerJoiner::default(), &word_docs, &[text_column])
        .join(InnerJoiner::default(), &doc_count, &[])
        .map(TfIdfMapper::new(
            "tf",
            "docs_number",
            "words_number",
            result_column,
        ))
        .sort(&[text_column])
        .reduce(TopN::new(result_column, 3), &[text_column])
        .map(Project::new(&[doc_column, text_column, result_column]))
        .sort(&[doc_column, text_column])
}

/// Top ten words per document by pointwise mutual information, considering
/// words longer than four characters that occur at least twice in the
/// document.
pub fn pmi_graph(input: &str, doc_column: &str, text_column: &str, result_column: &str) -> Graph {
    let text = text_column.to_string();
    let words = Graph::from_iter(input)
        .map(FilterPunctuation::new(text_column))
        .map(LowerCase::new(text_column))
        .map(Split::new(text_column))
        .sort(&[doc_column, text_column])
        .map(Filter::new(move |row| word_longer_than(row, &text, 4)));

    let frequent = words
        .reduce(Count::new("count"), &[doc_column, text_column])
        .map(Filter::new(|row| count_at_least(row, "count", 2)))
        .join(InnerJoiner::default(), &words, &[doc_column, text_column])
        .sort(&[doc_column, text_column])
        .reduce(TermFrequency::new(text_column, "doc_freq"), &[doc_column])
        .join(InnerJoiner::default(), &words, &[doc_column, text_column])
        .sort(&[text_column]);

    frequent
        .reduce(TermFrequency::new(text_column, "total_freq"), &[])
        .join(InnerJoiner::default(), &frequent, &[text_column])
        .reduce(FirstReducer, &[doc_column, text_column])
        .sort(&[doc_column, text_column])
        .map(PmiMapper::new("doc_freq", "total_freq", result_column))
        .map(Project::new(&[doc_column, text_column, result_column]))
        .reduce(TopN::new(result_column, 10), &[doc_column])
}

/// Average speed in km/h bucketed by weekday and hour.
///
/// Expects two inputs: travel times with `edge_id`, `enter_time` and
/// `leave_time` timestamp columns, and road geometry with `edge_id`,
/// `start` and `end` coordinate columns.
pub fn average_speed_graph(input_time: &str, input_length: &str) -> Graph {
    let distances = Graph::from_iter(input_length)
        .map(HaversineMapper::new("start", "end", "distance"))
        .map(Project::new(&["edge_id", "distance"]))
        .sort(&["edge_id"]);

    let times = Graph::from_iter(input_time)
        .map(TimeProcessMapper::new(
            "enter_time",
            "leave_time",
            "duration",
            "hour",
            "weekday",
        ))
        .map(Project::new(&["edge_id", "duration", "hour", "weekday"]))
        .sort(&["edge_id"]);

    times
        .join(InnerJoiner::default(), &distances, &["edge_id"])
        .sort(&["weekday", "hour"])
        .reduce(MultiSum::new(&["duration", "distance"]), &["weekday", "hour"])
        .map(SpeedMapper::new("distance", "duration", "speed"))
        .map(Project::new(&["weekday", "hour", "speed"]))
}

fn word_longer_than(row: &Row, column: &str, length: usize) -> bool {
    row.get(column)
        .and_then(Value::as_str)
        .is_some_and(|word| word.chars().count() > length)
}

fn count_at_least(row: &Row, column: &str, minimum: i64) -> bool {
    row.get(column)
        .and_then(Value::as_int)
        .is_some_and(|count| count >= minimum)
}
