use anyhow::bail;
use clap::Parser;
use core::time::Duration;

/// Runtime configuration for the `roster-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first), with defaults suitable for local use.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "roster-server",
    version,
    about = "A gRPC service for managing in-memory user records"
)]
pub struct CliArgs {
    /// Capacity of the response buffer between a `ListUsers` producer and the
    /// gRPC stream.
    ///
    /// Lower values make client disconnects visible to the producer sooner;
    /// higher values let the producer run further ahead of a slow client.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 8)]
    pub stream_buffer_size: usize,

    /// Pause between streamed records, in milliseconds.
    ///
    /// Purely for demonstrating incremental delivery. `0` streams as fast as
    /// the client reads.
    ///
    /// Environment variable: `STREAM_DELAY_MS`
    #[arg(long, env = "STREAM_DELAY_MS", default_value_t = 0)]
    pub stream_delay_ms: u64,

    /// Seconds to wait for in-flight streams to finish during shutdown before
    /// they are cancelled.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,

    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "0.0.0.0:50051" or "/tmp/roster.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub stream_buffer_size: usize,
    pub stream_delay: Duration,
    pub shutdown_timeout: Duration,
    pub server_addr: String,
    pub uds: bool,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        if args.server_addr.trim().is_empty() {
            bail!("SERVER_ADDR must not be empty");
        }

        Ok(Self {
            stream_buffer_size: args.stream_buffer_size,
            stream_delay: Duration::from_millis(args.stream_delay_ms),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            server_addr: args.server_addr,
            uds: args.uds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["roster-server"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn explicit_flags_are_converted() {
        let config = ServerConfig::try_from(args(&[
            "--stream-buffer-size",
            "2",
            "--stream-delay-ms",
            "100",
            "--shutdown-timeout",
            "5",
            "--server-addr",
            "127.0.0.1:6000",
        ]))
        .unwrap();

        assert_eq!(config.stream_buffer_size, 2);
        assert_eq!(config.stream_delay, Duration::from_millis(100));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.server_addr, "127.0.0.1:6000");
        assert!(!config.uds);
    }

    #[test]
    fn zero_buffer_is_rejected() {
        let err = ServerConfig::try_from(args(&["--stream-buffer-size", "0"])).unwrap_err();
        assert!(err.to_string().contains("STREAM_BUFFER_SIZE"));
    }

    #[test]
    fn blank_address_is_rejected() {
        let err = ServerConfig::try_from(args(&["--server-addr", " "])).unwrap_err();
        assert!(err.to_string().contains("SERVER_ADDR"));
    }
}
