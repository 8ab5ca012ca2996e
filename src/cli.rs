use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the json api.
    Daemon {},

    /// Print every list
    Lists {},

    /// Create a new list
    CreateList {
        /// List name
        name: String,
    },

    /// Print items, optionally filtered
    Items {
        /// Only items of this list ("all" disables the filter)
        #[clap(short, long)]
        list: Option<String>,

        /// Only items carrying this tag
        #[clap(short, long)]
        tag: Option<String>,

        /// Only items whose url contains this text
        #[clap(short, long)]
        platform: Option<String>,
    },

    /// Save an item to a list
    Save {
        /// a url
        url: String,

        /// Item title
        #[clap(short, long)]
        title: String,

        /// Target list id
        #[clap(short, long)]
        list: String,

        /// Free-form note, used for the item's embedding
        #[clap(short, long)]
        note: Option<String>,

        /// Comma separated tags
        #[clap(long)]
        tags: Option<String>,

        /// Preview image url
        #[clap(long)]
        image_url: Option<String>,
    },

    /// Update fields of a saved item
    Update {
        /// Item id
        id: String,

        #[clap(short, long)]
        url: Option<String>,

        /// Item title
        #[clap(short, long)]
        title: Option<String>,

        #[clap(short, long)]
        note: Option<String>,

        /// Replace tags (comma separated)
        #[clap(long)]
        tags: Option<String>,

        #[clap(long)]
        image_url: Option<String>,

        /// Move the item to another list
        #[clap(short, long)]
        list: Option<String>,
    },

    /// Delete an item
    Delete {
        /// Item id
        id: String,
    },

    /// Ask the language model for tags
    SuggestTags {
        url: String,

        #[clap(short, long, default_value = "")]
        title: String,

        /// Page content
        #[clap(short, long, default_value = "")]
        content: String,

        /// Comma separated tags already in use
        #[clap(short, long)]
        existing_tags: Option<String>,
    },

    /// Summarise page content into key takeaways
    Summarize {
        url: String,

        #[clap(short, long, default_value = "")]
        title: String,

        /// Page content. Only the first 1000 words are used.
        #[clap(short, long)]
        content: String,
    },

    /// Find the list closest to a page
    RelevantList {
        url: String,

        #[clap(short, long, default_value = "")]
        title: String,
    },
}
