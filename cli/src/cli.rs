use clap::Parser;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[clap(name = "gridspread", version)]
pub struct Cli {
    /// SQLite database URL for prices and spreads
    #[clap(long, env = "DATABASE_URL", default_value = "sqlite://gridspread.db?mode=rwc")]
    pub database_url: String,

    /// Seconds between mock price ticks
    #[clap(long, default_value = "10")]
    pub interval_secs: u64,

    /// Consumer group shared by all spread-calculator processes
    #[clap(long, default_value = "calculator_group")]
    pub group: String,

    /// This process's consumer name within the group; generated when omitted
    #[clap(long)]
    pub consumer: Option<String>,
}

impl Cli {
    /// Distinct per process so the stream can track pending entries per
    /// consumer identity.
    pub fn consumer_name(&self) -> String {
        self.consumer
            .clone()
            .unwrap_or_else(|| format!("calculator-{}", Uuid::new_v4()))
    }
}
