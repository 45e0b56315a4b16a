use super::PostSource;
use crate::types::SourceRecord;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

/// Reads one JSON object per line and yields them in pages of `page_size`.
/// Blank lines are skipped.
pub struct JsonlSource<R> {
    lines: Lines<R>,
    page_size: usize,
    line_no: usize,
}

impl JsonlSource<BufReader<File>> {
    pub async fn open(path: impl AsRef<Path>, page_size: usize) -> Result<Self> {
        let file = File::open(path.as_ref()).await?;
        Ok(Self::from_reader(BufReader::new(file), page_size))
    }
}

impl<R: AsyncBufRead + Unpin + Send> JsonlSource<R> {
    pub fn from_reader(reader: R, page_size: usize) -> Self {
        Self {
            lines: reader.lines(),
            page_size: page_size.max(1),
            line_no: 0,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> PostSource for JsonlSource<R> {
    async fn next_page(&mut self) -> Result<Option<Vec<SourceRecord>>> {
        let mut page = Vec::with_capacity(self.page_size);
        while page.len() < self.page_size {
            let Some(line) = self.lines.next_line().await? else {
                break;
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<serde_json::Value>(&line)? {
                serde_json::Value::Object(record) => page.push(record),
                _ => {
                    return Err(Error::source_with_context(
                        "expected a JSON object per line",
                        ErrorContext::new()
                            .with_details(format!("line {}", self.line_no))
                            .with_source("jsonl_source"),
                    ))
                }
            }
        }
        Ok(if page.is_empty() { None } else { Some(page) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_and_skips_blank_lines() {
        let data: &[u8] = b"{\"text\": \"a\"}\n\n{\"text\": \"b\"}\n{\"text\": \"c\"}\n";
        let mut src = JsonlSource::from_reader(data, 2);
        tokio_test::block_on(async {
            let p1 = src.next_page().await.unwrap().unwrap();
            assert_eq!(p1.len(), 2);
            assert_eq!(p1[1]["text"], "b");
            let p2 = src.next_page().await.unwrap().unwrap();
            assert_eq!(p2.len(), 1);
            assert!(src.next_page().await.unwrap().is_none());
        });
    }

    #[test]
    fn test_non_object_line_is_an_error() {
        let data: &[u8] = b"[1, 2]\n";
        let mut src = JsonlSource::from_reader(data, 10);
        let err = tokio_test::block_on(src.next_page()).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
