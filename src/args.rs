use clap::{Parser, ValueEnum};
use docs_harvest::ExportMode;

#[derive(Parser, Debug)]
#[command(name = "docs-harvest")]
#[command(about = "Export a Feishu/Lark document to Markdown with its images")]
#[command(version)]
pub struct Args {
    /// URL of the document to export
    pub url: String,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory the export folder is created in
    #[arg(short, long)]
    pub output: Option<String>,

    /// Export mode; remembered for later runs
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// URL for the WebDriver instance
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Settings file remembering the export mode
    #[arg(long, default_value = ".docs-harvest.json")]
    pub settings: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Folder,
    Download,
}

impl From<ModeArg> for ExportMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Folder => ExportMode::Folder,
            ModeArg::Download => ExportMode::Download,
        }
    }
}
