use clap::Parser;

/// 为 SEI 流程批量添加分区标签
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sei-tags", version, about)]
pub struct Cli {
    /// 不显示浏览器窗口
    #[arg(long)]
    pub headless: bool,

    /// 输出调试日志
    #[arg(short, long)]
    pub debug: bool,
}
