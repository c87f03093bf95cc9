//! Symbol explanations, analytics, and pattern analysis.

use chrono::Local;
use clap::Args;

use super::App;
use crate::render;

#[derive(Args, Debug)]
pub struct SymbolArgs {
    /// The symbol to explain, e.g. "falling teeth"
    #[arg(required = true)]
    pub symbol: Vec<String>,
}

#[derive(Args, Debug)]
pub struct AnalyticsArgs {
    /// Bucket the timeline by day instead of month
    #[arg(long)]
    pub days: bool,
    /// Print the raw summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn symbol(app: &App, args: SymbolArgs) -> anyhow::Result<()> {
    app.require_login()?;
    let symbol = args.symbol.join(" ");
    eprintln!("  Consulting the dream lexicon…");
    let explanation = app.api.explain_symbol(&symbol).await?;
    println!("{}", render::symbol_explanation(&explanation));
    Ok(())
}

pub async fn analytics(app: &App, args: AnalyticsArgs) -> anyhow::Result<()> {
    app.require_login()?;
    let summary = app.api.analytics_summary().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render::analytics(&summary, &Local, args.days));
    }
    Ok(())
}

pub async fn patterns(app: &App) -> anyhow::Result<()> {
    app.require_login()?;
    eprintln!("  Analyzing patterns across your journal…");
    let analysis = app.api.analyze_patterns().await?;
    println!("{}", render::patterns(&analysis));
    Ok(())
}
