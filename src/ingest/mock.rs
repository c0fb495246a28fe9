//! Synthetic judgment corpus for development and testing.
//!
//! Produces realistic-shaped judgment files when no real corpus is
//! available. Content is random but the file layout matches what the
//! ingest pipeline and the document store expect.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::errors::ApiError;

const LEGAL_TERMS: &[&str] = &[
    "contract", "tort", "negligence", "liability", "damages", "breach",
    "plaintiff", "defendant", "appellant", "respondent", "petition",
    "writ", "mandamus", "certiorari", "habeas corpus", "prima facie",
    "res judicata", "stare decisis", "obiter dicta", "ratio decidendi",
];

const CASE_TYPES: &[&str] = &[
    "Civil Appeal",
    "Criminal Appeal",
    "Special Leave Petition",
    "Writ Petition",
    "Transfer Petition",
    "Review Petition",
];

const COURTS: &[&str] = &[
    "Supreme Court of India",
    "Delhi High Court",
    "Bombay High Court",
    "Calcutta High Court",
    "Madras High Court",
];

const JUDGES: &[&str] = &[
    "Justice A.K. Sikri",
    "Justice S.A. Bobde",
    "Justice N.V. Ramana",
    "Justice D.Y. Chandrachud",
    "Justice Rohinton Nariman",
    "Justice Indu Malhotra",
    "Justice Hemant Gupta",
];

/// Writes `count` mock judgments under `raw_dir` as `mock_NNNN.json`.
/// A fixed seed makes repeated runs reproduce the same corpus.
pub fn generate_corpus(raw_dir: &Path, count: usize, seed: u64) -> Result<Vec<String>, ApiError> {
    std::fs::create_dir_all(raw_dir).map_err(ApiError::internal)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut doc_ids = Vec::with_capacity(count);
    for i in 0..count {
        let doc_id = format!("mock_{i:04}");
        let judgment = generate_judgment(&mut rng);
        let path = raw_dir.join(format!("{doc_id}.json"));
        std::fs::write(
            &path,
            serde_json::to_string_pretty(&judgment).map_err(ApiError::internal)?,
        )
        .map_err(ApiError::internal)?;
        doc_ids.push(doc_id);
    }

    tracing::info!(count, dir = %raw_dir.display(), "Mock corpus written");
    Ok(doc_ids)
}

fn generate_judgment(rng: &mut StdRng) -> serde_json::Value {
    // Fixed anchor keeps seeded corpora byte-identical across runs.
    let anchor = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let date = anchor - Duration::days(rng.random_range(1..3650));
    let case_number = format!("{}/{}", rng.random_range(100..10000), date.format("%Y"));
    let court = pick(rng, COURTS);
    let case_type = pick(rng, CASE_TYPES);

    let petitioner = format!("Party {}", (b'A' + rng.random_range(0..26)) as char);
    let respondent = format!("Party {}", (b'A' + rng.random_range(0..26)) as char);
    let title = format!("{petitioner} vs {respondent}");

    let bench: Vec<&str> = {
        let n = rng.random_range(1..=3);
        let mut order: Vec<usize> = (0..JUDGES.len()).collect();
        for i in 0..n {
            let j = rng.random_range(i..JUDGES.len());
            order.swap(i, j);
        }
        order.into_iter().take(n).map(|idx| JUDGES[idx]).collect()
    };

    let body = generate_body(rng, &title, court, case_type, &case_number);

    json!({
        "title": title,
        "court": court,
        "date": date.format("%Y-%m-%d").to_string(),
        "casenumber": format!("{case_type} No. {case_number}"),
        "bench": bench,
        "doc": body,
    })
}

fn generate_body(
    rng: &mut StdRng,
    title: &str,
    court: &str,
    case_type: &str,
    case_number: &str,
) -> String {
    let mut paragraphs = Vec::new();
    paragraphs.push(format!(
        "<div class=\"judgment\"><div class=\"docsource\">{court}</div>\
         <div class=\"docnumber\">{case_type} No. {case_number}</div><h2>{title}</h2>"
    ));

    for _ in 0..rng.random_range(3..7) {
        let a = pick(rng, LEGAL_TERMS);
        let b = pick(rng, LEGAL_TERMS);
        let c = pick(rng, LEGAL_TERMS);
        paragraphs.push(format!(
            "<p>The question of {a} arises in the context of {b}. Having considered the \
             submissions, the court holds that the principle of {c} applies to the facts \
             of this case.</p>"
        ));
    }

    paragraphs.push("<p>The appeal is disposed of accordingly.</p></div>".to_string());
    paragraphs.join("\n")
}

fn pick<'a>(rng: &mut StdRng, options: &'a [&'a str]) -> &'a str {
    options[rng.random_range(0..options.len())]
}
