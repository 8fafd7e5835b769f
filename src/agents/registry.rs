use serde::Serialize;

/// What an AI agent does with the content it fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentCategory {
    /// Collects content for model training
    Training,
    /// Indexes content for AI search products
    Search,
    /// Fetches on behalf of a user in an assistant session
    Assistant,
}

impl AgentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Search => "search",
            Self::Assistant => "assistant",
        }
    }
}

/// One registry entry: a user-agent substring and what it identifies
#[derive(Debug, Clone, Copy)]
pub struct AgentSignature {
    /// Lowercase substring looked for in the user-agent string
    pub pattern: &'static str,
    pub name: &'static str,
    pub operator: &'static str,
    pub category: AgentCategory,
    pub tags: &'static [&'static str],
}

/// Known AI content-ingestion agents, evaluated top to bottom
///
/// More specific patterns must come before patterns they contain.
pub const AGENT_REGISTRY: &[AgentSignature] = &[
    AgentSignature {
        pattern: "gptbot",
        name: "GPTBot",
        operator: "OpenAI",
        category: AgentCategory::Training,
        tags: &["openai", "crawler"],
    },
    AgentSignature {
        pattern: "chatgpt-user",
        name: "ChatGPT-User",
        operator: "OpenAI",
        category: AgentCategory::Assistant,
        tags: &["openai", "user-initiated"],
    },
    AgentSignature {
        pattern: "oai-searchbot",
        name: "OAI-SearchBot",
        operator: "OpenAI",
        category: AgentCategory::Search,
        tags: &["openai", "crawler"],
    },
    AgentSignature {
        pattern: "claude-user",
        name: "Claude-User",
        operator: "Anthropic",
        category: AgentCategory::Assistant,
        tags: &["anthropic", "user-initiated"],
    },
    AgentSignature {
        pattern: "claude-searchbot",
        name: "Claude-SearchBot",
        operator: "Anthropic",
        category: AgentCategory::Search,
        tags: &["anthropic", "crawler"],
    },
    AgentSignature {
        pattern: "claudebot",
        name: "ClaudeBot",
        operator: "Anthropic",
        category: AgentCategory::Training,
        tags: &["anthropic", "crawler"],
    },
    AgentSignature {
        pattern: "claude-web",
        name: "Claude-Web",
        operator: "Anthropic",
        category: AgentCategory::Assistant,
        tags: &["anthropic", "user-initiated"],
    },
    AgentSignature {
        pattern: "anthropic-ai",
        name: "anthropic-ai",
        operator: "Anthropic",
        category: AgentCategory::Training,
        tags: &["anthropic", "crawler"],
    },
    AgentSignature {
        pattern: "perplexity-user",
        name: "Perplexity-User",
        operator: "Perplexity",
        category: AgentCategory::Assistant,
        tags: &["perplexity", "user-initiated"],
    },
    AgentSignature {
        pattern: "perplexitybot",
        name: "PerplexityBot",
        operator: "Perplexity",
        category: AgentCategory::Search,
        tags: &["perplexity", "crawler"],
    },
    AgentSignature {
        pattern: "google-extended",
        name: "Google-Extended",
        operator: "Google",
        category: AgentCategory::Training,
        tags: &["google", "crawler"],
    },
    AgentSignature {
        pattern: "googleother",
        name: "GoogleOther",
        operator: "Google",
        category: AgentCategory::Training,
        tags: &["google", "crawler"],
    },
    AgentSignature {
        pattern: "applebot-extended",
        name: "Applebot-Extended",
        operator: "Apple",
        category: AgentCategory::Training,
        tags: &["apple", "crawler"],
    },
    AgentSignature {
        pattern: "meta-externalagent",
        name: "Meta-ExternalAgent",
        operator: "Meta",
        category: AgentCategory::Training,
        tags: &["meta", "crawler"],
    },
    AgentSignature {
        pattern: "meta-externalfetcher",
        name: "Meta-ExternalFetcher",
        operator: "Meta",
        category: AgentCategory::Assistant,
        tags: &["meta", "user-initiated"],
    },
    AgentSignature {
        pattern: "bytespider",
        name: "Bytespider",
        operator: "ByteDance",
        category: AgentCategory::Training,
        tags: &["bytedance", "crawler"],
    },
    AgentSignature {
        pattern: "ccbot",
        name: "CCBot",
        operator: "Common Crawl",
        category: AgentCategory::Training,
        tags: &["commoncrawl", "crawler"],
    },
    AgentSignature {
        pattern: "cohere-training-data-crawler",
        name: "cohere-training-data-crawler",
        operator: "Cohere",
        category: AgentCategory::Training,
        tags: &["cohere", "crawler"],
    },
    AgentSignature {
        pattern: "cohere-ai",
        name: "cohere-ai",
        operator: "Cohere",
        category: AgentCategory::Assistant,
        tags: &["cohere", "user-initiated"],
    },
    AgentSignature {
        pattern: "mistralai-user",
        name: "MistralAI-User",
        operator: "Mistral",
        category: AgentCategory::Assistant,
        tags: &["mistral", "user-initiated"],
    },
    AgentSignature {
        pattern: "amazonbot",
        name: "Amazonbot",
        operator: "Amazon",
        category: AgentCategory::Search,
        tags: &["amazon", "crawler"],
    },
    AgentSignature {
        pattern: "duckassistbot",
        name: "DuckAssistBot",
        operator: "DuckDuckGo",
        category: AgentCategory::Assistant,
        tags: &["duckduckgo", "crawler"],
    },
    AgentSignature {
        pattern: "youbot",
        name: "YouBot",
        operator: "You.com",
        category: AgentCategory::Search,
        tags: &["you", "crawler"],
    },
    AgentSignature {
        pattern: "ai2bot",
        name: "AI2Bot",
        operator: "Allen Institute for AI",
        category: AgentCategory::Training,
        tags: &["ai2", "crawler"],
    },
    AgentSignature {
        pattern: "diffbot",
        name: "Diffbot",
        operator: "Diffbot",
        category: AgentCategory::Training,
        tags: &["diffbot", "crawler"],
    },
    AgentSignature {
        pattern: "timpibot",
        name: "Timpibot",
        operator: "Timpi",
        category: AgentCategory::Training,
        tags: &["timpi", "crawler"],
    },
];
