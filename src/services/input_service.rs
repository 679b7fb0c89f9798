//! 交互输入服务
//!
//! 向操作员询问流程号、标签和是否开始执行

use std::io::{BufRead, Write};
use std::sync::OnceLock;

use anyhow::{bail, Result};
use regex::Regex;

use crate::models::Tag;

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[,\s]+").expect("分隔符正则无效"))
}

/// 按逗号或空白拆分流程号，丢弃空项
pub fn parse_identifiers(raw: &str) -> Vec<String> {
    separator()
        .split(raw)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 交互输入服务
pub struct InputService<R, W> {
    input: R,
    output: W,
}

impl InputService<std::io::StdinLock<'static>, std::io::Stdout> {
    /// 使用标准输入输出
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> InputService<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// 询问流程号列表，输入为空时重新询问
    pub fn ask_identifiers(&mut self) -> Result<Vec<String>> {
        loop {
            let line = self.prompt("请输入 SEI 流程号（用逗号或空格分隔）: ")?;
            let identifiers = parse_identifiers(&line);
            if !identifiers.is_empty() {
                return Ok(identifiers);
            }
            writeln!(self.output, "请至少输入一个流程号")?;
        }
    }

    /// 从固定列表中选择标签，可输入序号或标签名
    pub fn select_tag(&mut self) -> Result<Tag> {
        writeln!(self.output, "请选择分区标签:")?;
        for (i, tag) in Tag::ALL.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, tag)?;
        }

        loop {
            let line = self.prompt("标签: ")?;
            let answer = line.trim();
            let by_index = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| Tag::ALL.get(i).copied());
            if let Some(tag) = by_index.or_else(|| Tag::parse(answer)) {
                return Ok(tag);
            }
            writeln!(self.output, "无效的选择: {}", answer)?;
        }
    }

    /// 确认是否开始处理，直接回车视为确认
    pub fn confirm_execution(&mut self, count: usize) -> Result<bool> {
        loop {
            let line = self.prompt(&format!("处理 {} 个流程？[Y/n] ", count))?;
            match line.trim().to_lowercase().as_str() {
                "" | "y" | "yes" | "s" | "sim" | "是" => return Ok(true),
                "n" | "no" | "nao" | "não" | "否" => return Ok(false),
                other => writeln!(self.output, "请输入 y 或 n（收到: {}）", other)?,
            }
        }
    }

    fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("输入已结束");
        }
        Ok(line)
    }
}
