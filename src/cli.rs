use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "deskBot", about = "Scheduled desk reservation agent")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reserve the configured desk `LEAD_DAYS` ahead of today.
    Book,
    /// Confirm attendance for today's reservation.
    Checkin,
}
