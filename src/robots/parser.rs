//! Robots.txt block parser
//!
//! Content is parsed into user-agent blocks: an agent name plus the directive
//! lines that apply to it. Consecutive `User-agent` lines share one directive
//! group, and each agent gets its own block holding a copy of the group's
//! directives. Blank lines and `#` comments are dropped.

/// Separator written between origin and managed content in append mode
pub const APPEND_SEPARATOR: &str = "# --- Managed by Botmon ---";

/// Directives that belong to one user agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotsBlock {
    /// Agent name as written in the file
    pub agent: String,
    /// Directive lines, e.g. `Disallow: /private`
    pub directives: Vec<String>,
}

impl RobotsBlock {
    fn is_agent(&self, agent: &str) -> bool {
        self.agent.eq_ignore_ascii_case(agent)
    }
}

/// Parsed robots.txt content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRobots {
    /// One block per distinct agent, in first-seen order
    pub blocks: Vec<RobotsBlock>,
    /// `Sitemap:` URLs, which are not tied to any agent
    pub sitemaps: Vec<String>,
}

impl ParsedRobots {
    /// Parses raw robots.txt content
    ///
    /// An agent that appears in more than one group has all its directives
    /// folded into its first block.
    pub fn parse(content: &str) -> Self {
        let mut parsed = ParsedRobots::default();
        let mut current_group: Vec<usize> = Vec::new();
        let mut reading_agents = false;

        for line in content.lines() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after directives starts a new group
                    if !reading_agents {
                        current_group.clear();
                    }
                    reading_agents = true;

                    let index = parsed.block_index_or_insert(value);
                    if !current_group.contains(&index) {
                        current_group.push(index);
                    }
                }
                "sitemap" => {
                    if !parsed.sitemaps.iter().any(|s| s == value) {
                        parsed.sitemaps.push(value.to_string());
                    }
                }
                _ => {
                    reading_agents = false;
                    if current_group.is_empty() {
                        tracing::debug!(line, "Dropping robots.txt directive outside any group");
                        continue;
                    }
                    for &index in &current_group {
                        parsed.blocks[index].directives.push(line.to_string());
                    }
                }
            }
        }

        parsed
    }

    /// Finds the block for an agent (case-insensitive)
    pub fn find(&self, agent: &str) -> Option<&RobotsBlock> {
        self.blocks.iter().find(|b| b.is_agent(agent))
    }

    /// Renders the blocks back to robots.txt text
    pub fn render(&self) -> String {
        let mut sections: Vec<String> = self
            .blocks
            .iter()
            .map(|block| {
                let mut lines = Vec::with_capacity(block.directives.len() + 1);
                lines.push(format!("User-agent: {}", block.agent));
                lines.extend(block.directives.iter().cloned());
                lines.join("\n")
            })
            .collect();

        if !self.sitemaps.is_empty() {
            sections.push(
                self.sitemaps
                    .iter()
                    .map(|s| format!("Sitemap: {}", s))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }

        if sections.is_empty() {
            return String::new();
        }

        let mut out = sections.join("\n\n");
        out.push('\n');
        out
    }

    fn block_index_or_insert(&mut self, agent: &str) -> usize {
        if let Some(index) = self.blocks.iter().position(|b| b.is_agent(agent)) {
            return index;
        }
        self.blocks.push(RobotsBlock {
            agent: agent.to_string(),
            directives: Vec::new(),
        });
        self.blocks.len() - 1
    }
}

/// Merges managed robots.txt content into origin content, block by block
///
/// - A managed block replaces the origin block for the same agent, in the
///   origin block's position
/// - Origin blocks without a managed counterpart pass through unchanged
/// - Managed-only agents follow all origin-derived blocks
/// - Sitemap lines are the union of both, origin first
///
/// # Examples
///
/// ```
/// use botmon_edge::robots::merge_robots_txt;
///
/// let merged = merge_robots_txt("User-agent: *\nAllow: /", "User-agent: *\nDisallow: /private");
/// assert_eq!(merged, "User-agent: *\nDisallow: /private\n");
/// ```
pub fn merge_robots_txt(origin: &str, managed: &str) -> String {
    let origin = ParsedRobots::parse(origin);
    let managed = ParsedRobots::parse(managed);

    let mut merged = ParsedRobots::default();

    for block in &origin.blocks {
        match managed.find(&block.agent) {
            Some(replacement) => merged.blocks.push(replacement.clone()),
            None => merged.blocks.push(block.clone()),
        }
    }

    for block in &managed.blocks {
        if origin.find(&block.agent).is_none() {
            merged.blocks.push(block.clone());
        }
    }

    merged.sitemaps = origin.sitemaps.clone();
    for sitemap in managed.sitemaps {
        if !merged.sitemaps.contains(&sitemap) {
            merged.sitemaps.push(sitemap);
        }
    }

    merged.render()
}

/// Concatenates origin and managed content with a visible separator
///
/// Managed content always comes last. Empty origin content yields the managed
/// content alone.
pub fn append_robots_txt(origin: &str, managed: &str) -> String {
    if origin.trim().is_empty() {
        return managed.to_string();
    }
    format!("{}\n\n{}\n{}", origin.trim_end(), APPEND_SEPARATOR, managed)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}
