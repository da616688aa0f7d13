//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ecoroute_domain::{
    PointIn, RouteCalculationRequest, SearchHistoryParams, SearchParams, TransportMode,
};

/// EcoRoute API client.
#[derive(Debug, Parser)]
#[command(name = "ecoroute", version, about)]
pub struct Cli {
    /// Config file (defaults to ./ecoroute.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the API base URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Override the directory holding session files.
    #[arg(long, global = true)]
    pub session_dir: Option<PathBuf>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "ECOROUTE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session.
    Logout,
    /// Show the stored session status.
    Status,
    /// Show the logged-in user.
    Me,
    /// Compare shortest and most efficient routes.
    Route(RouteArgs),
    /// List past searches.
    History(HistoryArgs),
    /// Search history statistics.
    Stats,
    /// Delete a past search.
    DeleteSearch {
        /// Search id.
        id: String,
    },
    /// Full-text search.
    Search(SearchArgs),
}

/// Arguments of `route`.
#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Origin name.
    #[arg(long)]
    pub from_name: String,
    /// Origin latitude.
    #[arg(long, allow_negative_numbers = true)]
    pub from_lat: f64,
    /// Origin longitude.
    #[arg(long, allow_negative_numbers = true)]
    pub from_lng: f64,
    /// Destination name.
    #[arg(long)]
    pub to_name: String,
    /// Destination latitude.
    #[arg(long, allow_negative_numbers = true)]
    pub to_lat: f64,
    /// Destination longitude.
    #[arg(long, allow_negative_numbers = true)]
    pub to_lng: f64,
    /// Cargo weight in kilograms.
    #[arg(long)]
    pub weight: f64,
    /// Transport mode: land, sea or air.
    #[arg(long, default_value = "land")]
    pub mode: TransportMode,
}

impl From<RouteArgs> for RouteCalculationRequest {
    fn from(args: RouteArgs) -> Self {
        Self {
            origin: PointIn::new(args.from_name, args.from_lat, args.from_lng),
            destination: PointIn::new(args.to_name, args.to_lat, args.to_lng),
            cargo_weight_kg: args.weight,
            transport_mode: args.mode,
        }
    }
}

/// Arguments of `history`.
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Page number, starting at 1.
    #[arg(long)]
    pub page: Option<u32>,
    /// Page size.
    #[arg(long)]
    pub limit: Option<u32>,
    /// Sort expression, e.g. `-created_at`.
    #[arg(long)]
    pub sort: Option<String>,
    /// Only this transport mode.
    #[arg(long)]
    pub mode: Option<TransportMode>,
}

impl From<HistoryArgs> for SearchHistoryParams {
    fn from(args: HistoryArgs) -> Self {
        Self {
            page: args.page,
            limit: args.limit,
            sort: args.sort,
            mode: args.mode,
        }
    }
}

/// Arguments of `search`.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Query text, at least two characters.
    pub query: String,
    /// Index to search.
    #[arg(long)]
    pub index: String,
    /// Field to match; repeat for several.
    #[arg(long = "field")]
    pub fields: Vec<String>,
    /// Page number.
    #[arg(long)]
    pub page: Option<u32>,
    /// Page size.
    #[arg(long)]
    pub limit: Option<u32>,
}

impl From<SearchArgs> for SearchParams {
    fn from(args: SearchArgs) -> Self {
        Self {
            fields: args.fields,
            page: args.page,
            limit: args.limit,
            ..Self::new(args.query, args.index)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_route_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "ecoroute",
            "route",
            "--from-name",
            "Madrid",
            "--from-lat",
            "40.4",
            "--from-lng",
            "-3.7",
            "--to-name",
            "Valencia",
            "--to-lat",
            "39.5",
            "--to-lng",
            "-0.4",
            "--weight",
            "1500",
            "--mode",
            "sea",
        ])
        .unwrap();

        let Command::Route(args) = cli.command else {
            panic!("expected route");
        };
        let request = RouteCalculationRequest::from(args);
        assert!((request.origin.lng + 3.7).abs() < f64::EPSILON);
        assert_eq!(request.transport_mode, TransportMode::Sea);
    }

    #[test]
    fn test_search_fields_repeat() {
        let cli = Cli::try_parse_from([
            "ecoroute", "search", "madrid", "--index", "routes", "--field", "origin", "--field",
            "destination",
        ])
        .unwrap();

        let Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        let params = SearchParams::from(args);
        assert_eq!(params.fields, vec!["origin", "destination"]);
        assert_eq!(params.index, "routes");
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::try_parse_from(["ecoroute", "status", "--api-url", "http://x"]).unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://x"));
    }
}
