use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use image_grab::{GrabberConfig, ImageSize, SessionRequest};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "image-grab")]
#[command(about = "Finds images on a search result page and downloads them")]
#[command(version)]
pub struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter (e.g. "debug", "image_grab=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Number of concurrent downloads
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search for images and save them
    Search(SearchArgs),

    /// Download images from a saved link file
    Download(DownloadArgs),
}

#[derive(ClapArgs, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Number of images to look for
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Size filter
    #[arg(short, long, value_enum)]
    pub size: Option<SizeArg>,

    /// Scrolls without new images before giving up
    #[arg(long)]
    pub stall_limit: Option<usize>,

    /// Only collect links, do not download images
    #[arg(long)]
    pub no_images: bool,

    /// Write the links to `<output>/<query>_links.txt`
    #[arg(long)]
    pub save_links: bool,

    /// Output folder
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub show_browser: bool,
}

#[derive(ClapArgs, Debug)]
pub struct DownloadArgs {
    /// File with one image URL per line
    pub links_file: PathBuf,

    /// Folder to save the images to
    pub destination: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SizeArg {
    Small,
    Medium,
    Large,
}

/// Convert from CLI size argument to the search size filter
pub fn convert_size(arg: SizeArg) -> ImageSize {
    match arg {
        SizeArg::Small => ImageSize::Small,
        SizeArg::Medium => ImageSize::Medium,
        SizeArg::Large => ImageSize::Large,
    }
}

impl Args {
    /// Applies global flags on top of the loaded configuration
    pub fn apply_to(&self, config: &mut GrabberConfig) {
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Command::Search(search) = &self.command {
            if let Some(output) = &search.output {
                config.output_root = output.clone();
            }
            if search.show_browser {
                config.headless = false;
            }
        }
    }
}

impl SearchArgs {
    pub fn to_request(&self, config: &GrabberConfig) -> SessionRequest {
        let mut request = SessionRequest::from_config(&self.query, config);
        if let Some(count) = self.count {
            request.count = count;
        }
        if let Some(size) = self.size {
            request.size = convert_size(size);
        }
        if let Some(stall_limit) = self.stall_limit {
            request.stall_limit = stall_limit;
        }
        request.save_images = !self.no_images;
        request.save_links = self.save_links;
        request
    }
}
