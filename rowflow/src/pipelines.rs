//! Prebuilt reference pipelines: word count and the TF-IDF inverted index.

use std::path::PathBuf;

use crate::graph::Graph;
use crate::ops::{
    Count, FilterPunctuation, First, Idf, InnerJoiner, LowerCase, Project, Split, Suffixes, Tf,
    TfIdf, TopN, json_line_parser,
};

fn count_words(source: Graph, text_column: &str, count_column: &str) -> Graph {
    source
        .map(FilterPunctuation::new(text_column))
        .map(LowerCase::new(text_column))
        .map(Split::new(text_column))
        .sort(&[text_column])
        .reduce(Count::new(count_column), &[text_column])
        .sort(&[count_column, text_column])
}

/// Counts words of `text_column` over the source named `input`, ascending
/// by (count, word).
pub fn word_count(input: &str, text_column: &str, count_column: &str) -> Graph {
    count_words(Graph::from_iter(input), text_column, count_column)
}

/// [`word_count`] over a JSON-lines file instead of a bound source.
pub fn word_count_from_file(
    path: impl Into<PathBuf>,
    text_column: &str,
    count_column: &str,
) -> Graph {
    count_words(
        Graph::from_file(path, json_line_parser),
        text_column,
        count_column,
    )
}

/// TF-IDF for every word/document pair over the source named `input`,
/// keeping the three highest-scoring documents per word.
pub fn inverted_index(
    input: &str,
    doc_column: &str,
    text_column: &str,
    result_column: &str,
) -> Graph {
    let docs_count_column = "total_docs";
    let term_occ_column = "term_occ";
    let bare = || InnerJoiner::with_suffixes(Suffixes::new("", ""));

    let split_words = Graph::from_iter(input)
        .map(FilterPunctuation::new(text_column))
        .map(LowerCase::new(text_column))
        .map(Split::new(text_column));

    let count_docs = Graph::from_iter(input)
        .sort(&[doc_column])
        .reduce(First, &[doc_column])
        .reduce(Count::new(docs_count_column), &[]);

    let count_idf = split_words
        .sort(&[doc_column, text_column])
        .reduce(First, &[doc_column, text_column])
        .sort(&[text_column])
        .reduce(Count::new(term_occ_column), &[text_column])
        .join(bare(), &count_docs, &[])
        .map(Idf::new(docs_count_column, term_occ_column))
        .sort(&[text_column]);

    let count_tf = split_words
        .sort(&[doc_column])
        .reduce(Tf::new(text_column), &[doc_column])
        .sort(&[text_column]);

    count_idf
        .join(bare(), &count_tf, &[text_column])
        .map(TfIdf::new().with_result_column(result_column))
        .map(Project::new(&[doc_column, text_column, result_column]))
        .sort(&[text_column])
        .reduce(TopN::new(result_column, 3), &[text_column])
}
