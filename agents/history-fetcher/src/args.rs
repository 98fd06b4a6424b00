use activity_core::AssetId;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[clap(version, about)]
/// Page through an account's activity history
pub(crate) struct Args {
    /// Configured chain to read from
    #[clap(short, long)]
    pub chain: String,
    /// Account to page through, defaults to the chain's configured account
    #[clap(short, long)]
    pub account: Option<String>,
    /// Only list activities touching this asset (`native`, `<contract>` or
    /// `<contract>_<token id>`)
    #[clap(long)]
    pub asset: Option<AssetId>,
    /// Stop after this many pages
    #[clap(short, long)]
    pub pages: Option<u32>,
    /// Print the cache counters to stderr when done
    #[clap(long)]
    pub print_metrics: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_asset_slug() {
        let args = Args::parse_from([
            "history-fetcher",
            "--chain",
            "ethereum",
            "--asset",
            "0xdac17f958d2ee523a2206206994597c13d831ec7",
            "--pages",
            "3",
        ]);
        assert_eq!(
            args.asset,
            Some(AssetId::token("0xdac17f958d2ee523a2206206994597c13d831ec7", None))
        );
        assert_eq!(args.pages, Some(3));
        assert!(args.account.is_none());
        assert!(!args.print_metrics);
    }
}
