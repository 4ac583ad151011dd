//! `[OUTPUT]` 段构建器
//!
//! 转发代理的配置由若干 `[OUTPUT]` 段组成，每段以空行开头，
//! 段内每行缩进四个空格。

use std::fmt::{self, Display, Write};

const SECTION_HEADER: &str = "[OUTPUT]";
const INDENT: &str = "    ";

/// 单个 `[OUTPUT]` 段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stanza {
    lines: Vec<String>,
}

impl Stanza {
    /// 以 `Name <name>` 开头的输出段
    pub fn output(name: &str) -> Self {
        Self::default().entry("Name", name)
    }

    /// 追加 `Key value` 行
    pub fn entry(mut self, key: &str, value: impl Display) -> Self {
        self.lines.push(format!("{key} {value}"));
        self
    }

    /// 追加原样的一行，允许为空
    pub fn line(mut self, raw: impl Into<String>) -> Self {
        self.lines.push(raw.into());
        self
    }

    /// 段内行数（不含段头）
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 将本段追加到输出缓冲区
    pub fn write_into(&self, out: &mut String) {
        // 写入 String 不会失败
        let _ = write!(out, "{self}");
    }
}

impl Display for Stanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('\n')?;
        f.write_str(SECTION_HEADER)?;
        f.write_char('\n')?;
        for line in &self.lines {
            writeln!(f, "{INDENT}{line}")?;
        }
        Ok(())
    }
}

/// 空注册表时使用的 null 输出段
pub fn null_stanza(stats_addr: &str) -> Stanza {
    Stanza::output("null")
        .entry("Match", "*")
        .entry("StatsAddr", stats_addr)
}
