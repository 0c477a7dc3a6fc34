//! Command table
//!
//! Maps each protocol command to the shape of its reply so one generic
//! dispatch (`Session::call`) serves every command. Arguments are passed
//! through unchanged.
//!
//! `albumart` and `readpicture` are not listed: they go through the
//! chunked fetcher (`Session::fetch_binary`).

use crate::protocol::ResponseShape::{self, First, Grouped, List, Nothing, Pairs, Record, Records};

/// Boundary keys of song lists
pub const SONG: &[&str] = &["file"];

/// Boundary keys of directory listings
pub const ENTRY: &[&str] = &["file", "directory", "playlist"];

/// Boundary keys of `listfiles`
pub const FILE_ENTRY: &[&str] = &["file", "directory"];

/// Boundary keys of `listplaylists`
pub const PLAYLIST: &[&str] = &["playlist"];

/// Boundary keys of `outputs`
pub const OUTPUT: &[&str] = &["outputid"];

/// Boundary keys of `decoders`
pub const DECODER: &[&str] = &["plugin"];

/// Boundary keys of `readmessages`
pub const MESSAGE: &[&str] = &["channel"];

/// Boundary keys of `plchangesposid`
pub const POSITION: &[&str] = &["cpos"];

/// Boundary keys of `listmounts`
pub const MOUNT: &[&str] = &["mount"];

/// Boundary keys of `listneighbors`
pub const NEIGHBOR: &[&str] = &["neighbor"];

/// One table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub shape: ResponseShape,
}

const fn cmd(name: &'static str, shape: ResponseShape) -> CommandSpec {
    CommandSpec { name, shape }
}

/// Every command `call` knows about
pub static COMMANDS: &[CommandSpec] = &[
    // -------------------------------------------------------------------------
    // Status
    // -------------------------------------------------------------------------
    cmd("clearerror", Nothing),
    cmd("currentsong", First(SONG)),
    cmd("status", Record),
    cmd("stats", Record),
    // -------------------------------------------------------------------------
    // Playback Options
    // -------------------------------------------------------------------------
    cmd("consume", Nothing),
    cmd("crossfade", Nothing),
    cmd("mixrampdb", Nothing),
    cmd("mixrampdelay", Nothing),
    cmd("random", Nothing),
    cmd("repeat", Nothing),
    cmd("setvol", Nothing),
    cmd("getvol", Record),
    cmd("volume", Nothing),
    cmd("single", Nothing),
    cmd("replay_gain_mode", Nothing),
    cmd("replay_gain_status", Record),
    // -------------------------------------------------------------------------
    // Playback Control
    // -------------------------------------------------------------------------
    cmd("next", Nothing),
    cmd("pause", Nothing),
    cmd("play", Nothing),
    cmd("playid", Nothing),
    cmd("previous", Nothing),
    cmd("seek", Nothing),
    cmd("seekid", Nothing),
    cmd("seekcur", Nothing),
    cmd("stop", Nothing),
    // -------------------------------------------------------------------------
    // Queue
    // -------------------------------------------------------------------------
    cmd("add", Nothing),
    cmd("addid", Record),
    cmd("clear", Nothing),
    cmd("delete", Nothing),
    cmd("deleteid", Nothing),
    cmd("move", Nothing),
    cmd("moveid", Nothing),
    cmd("playlistfind", Records(SONG)),
    cmd("playlistid", Records(SONG)),
    cmd("playlistinfo", Records(SONG)),
    cmd("playlistsearch", Records(SONG)),
    cmd("plchanges", Records(SONG)),
    cmd("plchangesposid", Records(POSITION)),
    cmd("prio", Nothing),
    cmd("prioid", Nothing),
    cmd("rangeid", Nothing),
    cmd("shuffle", Nothing),
    cmd("swap", Nothing),
    cmd("swapid", Nothing),
    cmd("addtagid", Nothing),
    cmd("cleartagid", Nothing),
    // -------------------------------------------------------------------------
    // Stored Playlists
    // -------------------------------------------------------------------------
    cmd("listplaylist", List),
    cmd("listplaylistinfo", Records(SONG)),
    cmd("listplaylists", Records(PLAYLIST)),
    cmd("load", Nothing),
    cmd("playlistadd", Nothing),
    cmd("playlistclear", Nothing),
    cmd("playlistdelete", Nothing),
    cmd("playlistmove", Nothing),
    cmd("rename", Nothing),
    cmd("rm", Nothing),
    cmd("save", Nothing),
    // -------------------------------------------------------------------------
    // Database
    // -------------------------------------------------------------------------
    cmd("count", Grouped),
    cmd("getfingerprint", Record),
    cmd("find", Records(SONG)),
    cmd("findadd", Nothing),
    cmd("list", Pairs),
    cmd("listall", Records(ENTRY)),
    cmd("listallinfo", Records(ENTRY)),
    cmd("listfiles", Records(FILE_ENTRY)),
    cmd("lsinfo", Records(ENTRY)),
    cmd("readcomments", First(&[])),
    cmd("search", Records(SONG)),
    cmd("searchadd", Nothing),
    cmd("searchaddpl", Nothing),
    cmd("searchcount", Grouped),
    cmd("update", Record),
    cmd("rescan", Record),
    // -------------------------------------------------------------------------
    // Mounts and Neighbors
    // -------------------------------------------------------------------------
    cmd("mount", Nothing),
    cmd("unmount", Nothing),
    cmd("listmounts", Records(MOUNT)),
    cmd("listneighbors", Records(NEIGHBOR)),
    // -------------------------------------------------------------------------
    // Stickers
    // -------------------------------------------------------------------------
    cmd("sticker", Pairs),
    // -------------------------------------------------------------------------
    // Connection
    // -------------------------------------------------------------------------
    cmd("ping", Nothing),
    cmd("tagtypes", Pairs),
    // -------------------------------------------------------------------------
    // Partitions
    // -------------------------------------------------------------------------
    cmd("partition", Nothing),
    cmd("listpartitions", List),
    cmd("newpartition", Nothing),
    cmd("delpartition", Nothing),
    cmd("moveoutput", Nothing),
    // -------------------------------------------------------------------------
    // Audio Outputs
    // -------------------------------------------------------------------------
    cmd("disableoutput", Nothing),
    cmd("enableoutput", Nothing),
    cmd("toggleoutput", Nothing),
    cmd("outputs", Records(OUTPUT)),
    cmd("outputset", Nothing),
    // -------------------------------------------------------------------------
    // Reflection
    // -------------------------------------------------------------------------
    cmd("config", Record),
    cmd("commands", List),
    cmd("notcommands", List),
    cmd("urlhandlers", List),
    cmd("decoders", Records(DECODER)),
    // -------------------------------------------------------------------------
    // Client to Client
    // -------------------------------------------------------------------------
    cmd("subscribe", Nothing),
    cmd("unsubscribe", Nothing),
    cmd("channels", List),
    cmd("readmessages", Records(MESSAGE)),
    cmd("sendmessage", Nothing),
];

/// Find a command by name
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|entry| entry.name == name)
}
