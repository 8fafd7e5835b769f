//! Robots.txt handling module
//!
//! This module parses robots.txt content into user-agent blocks and implements
//! the append and merge algorithms used by the managed robots.txt handler.

mod parser;

pub use parser::{append_robots_txt, merge_robots_txt, ParsedRobots, RobotsBlock, APPEND_SEPARATOR};
