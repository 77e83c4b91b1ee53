//! Command-line interface definitions for the `scw-volume` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser, Subcommand};

/// Top-level CLI for the `scw-volume` binary.
#[derive(Debug, Parser)]
#[command(
    name = "scw-volume",
    about = "Create, inspect, resize, and delete Scaleway Instance volumes",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, env = "SCW_VOLUME_LOG_JSON")]
    pub(crate) log_json: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Subcommands of `scw-volume`.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Create a volume and print its state.
    #[command(name = "create", about = "Create a volume and print its state")]
    Create(CreateCommand),
    /// Refresh a volume and print its state.
    #[command(name = "read", about = "Refresh a volume and print its state")]
    Read(VolumeIdArgs),
    /// Rename or grow a volume.
    #[command(name = "update", about = "Rename or grow a volume")]
    Update(UpdateCommand),
    /// Delete a volume once it is detached.
    #[command(name = "delete", about = "Delete a volume once it is detached")]
    Delete(VolumeIdArgs),
    /// Adopt an existing volume and print its state.
    #[command(name = "import", about = "Adopt an existing volume and print its state")]
    Import(VolumeIdArgs),
}

/// Arguments for `scw-volume create`.
#[derive(Debug, Args)]
pub(crate) struct CreateCommand {
    /// Storage class of the volume.
    #[arg(long = "type", value_name = "TYPE", value_parser = ["b_ssd", "l_ssd"])]
    pub(crate) volume_type: String,
    /// Volume name; a `vol-<uuid>` name is generated when omitted.
    #[arg(long, value_name = "NAME")]
    pub(crate) name: Option<String>,
    /// Size of an empty volume in gigabytes.
    #[arg(
        long,
        value_name = "GB",
        conflicts_with_all = ["from_volume_id", "from_snapshot_id"]
    )]
    pub(crate) size_in_gb: Option<u64>,
    /// Seed the volume from an existing volume (`<uuid>` or `<zone>/<uuid>`).
    #[arg(long, value_name = "ID", conflicts_with = "from_snapshot_id")]
    pub(crate) from_volume_id: Option<String>,
    /// Seed the volume from a snapshot (`<uuid>` or `<zone>/<uuid>`).
    #[arg(long, value_name = "ID")]
    pub(crate) from_snapshot_id: Option<String>,
    /// Zone to create the volume in; defaults to the configured zone.
    #[arg(long, value_name = "ZONE")]
    pub(crate) zone: Option<String>,
    /// Project owning the volume; defaults to the configured project.
    #[arg(long, value_name = "PROJECT")]
    pub(crate) project_id: Option<String>,
}

/// Arguments for `scw-volume update`.
#[derive(Debug, Args)]
pub(crate) struct UpdateCommand {
    /// Composite identifier `<zone>/<id>`.
    #[arg(value_name = "ID")]
    pub(crate) id: String,
    /// New volume name.
    #[arg(long, value_name = "NAME")]
    pub(crate) name: Option<String>,
    /// New size in gigabytes; block volumes only, never smaller.
    #[arg(long, value_name = "GB")]
    pub(crate) size_in_gb: Option<u64>,
}

/// Composite identifier argument shared by read, delete, and import.
#[derive(Debug, Args)]
pub(crate) struct VolumeIdArgs {
    /// Composite identifier `<zone>/<id>`.
    #[arg(value_name = "ID")]
    pub(crate) id: String,
}
