/// One completed query/answer pair.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub query: String,
    pub response: String,
}

/// In-memory conversation history for the current session.
///
/// Append-only while the process runs; nothing is written to disk.
#[derive(Debug, Default)]
pub struct History {
    exchanges: Vec<Exchange>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, query: &str, response: &str) {
        self.exchanges.push(Exchange {
            query: query.to_string(),
            response: response.to_string(),
        });
    }

    /// The last `count` exchanges, oldest first.
    pub fn recent(&self, count: usize) -> &[Exchange] {
        let start = self.exchanges.len().saturating_sub(count);
        &self.exchanges[start..]
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Builds the text sent to the LLM: recent exchanges, then the new query.
    pub fn contextualize(&self, query: &str, count: usize) -> String {
        let recent = self.recent(count);
        if recent.is_empty() {
            return query.to_string();
        }

        let context = recent
            .iter()
            .map(|e| format!("User: {}\nAI: {}", e.query, e.response))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{context}\n\nNew query: {query}")
    }
}
