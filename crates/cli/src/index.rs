use super::Result;
use bytesize::ByteSize;
use tracing::{Level, span};

pub(crate) fn run(file: String) -> Result<()> {
  let span = span!(Level::TRACE, "run");
  let _guard = span.enter();

  let text = crate::target_file::read(file)?;
  let index = crate::target_file::index(&text)?;

  let file_len = text.len() as u64;
  let file_size = ByteSize(file_len).to_string();
  let doc_count = index.doc_count();
  let term_count = index.term_count();
  let terms_len = index.terms_size() as u64;
  let terms_size = ByteSize(terms_len).to_string();
  let terms_percent = percent(terms_len, file_len);
  let postings_len = index.postings_size() as u64;
  let postings_size = ByteSize(postings_len).to_string();
  let postings_percent = percent(postings_len, file_len);

  println!("         docs: {doc_count}");
  println!("        terms: {term_count}");
  println!("    file size: {file_size}");
  println!("   terms size: {terms_size:>10} ({terms_percent:05.2}% of file)");
  println!("postings size: {postings_size:>10} ({postings_percent:05.2}% of file)");
  Ok(())
}

fn percent(part: u64, whole: u64) -> f64 {
  if whole == 0 {
    return 0.0;
  }
  (part as f64) / (whole as f64) * 100.0
}
