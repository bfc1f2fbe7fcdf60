use std::path::Path;

use anyhow::{Context, Result, bail};

/// One script line: hold `keys` for `frames` rendered frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub frames: u32,
    pub keys: Vec<String>,
}

/// Parse an input script. Each line is `<frames> [KEY...]`; blank lines and
/// `#` comments are skipped.
pub fn parse(src: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (n, line) in src.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let mut words = line.split_whitespace();
        let Some(count) = words.next() else {
            continue;
        };
        let frames: u32 = count
            .parse()
            .with_context(|| format!("line {}: bad frame count {count:?}", n + 1))?;
        if frames == 0 {
            bail!("line {}: frame count must be positive", n + 1);
        }
        steps.push(Step {
            frames,
            keys: words.map(str::to_string).collect(),
        });
    }
    Ok(steps)
}

pub fn load(path: &Path) -> Result<Vec<Step>> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    parse(&src).with_context(|| format!("in script {}", path.display()))
}

/// No keys for `frames` frames; used when no script is given.
pub fn idle(frames: u32) -> Vec<Step> {
    vec![Step {
        frames,
        keys: Vec::new(),
    }]
}
