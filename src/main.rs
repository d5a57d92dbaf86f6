use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use photo_catalog::catalog::Catalog;
use photo_catalog::model::Tag;
use photo_catalog::search::Query;
use photo_catalog::store::JsonFileStore;
use photo_catalog::{config, output, scan};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "photo-catalog")]
#[command(about = "Multi-user photo catalog with albums, captions and typed tags")]
#[command(long_about = "\
Multi-user photo catalog with albums, captions and typed tags

Each user owns albums; albums hold photos. The same image file may appear in
many albums (and under many users). Captions and tags belong to the image:
setting one on any record updates every record of the same file.

Tags are TYPE=VALUE pairs (Place=Paris, Person=Ada). A photo holds at most one
tag of a restricted type (Place, by default).

Images are named by file path or by file:// URI. Names of users, albums, tag
types and tag values are compared ignoring case.

On first run the catalog starts with a 'stock' user whose 'Stock Album' is
filled from data/stock. Run 'photo-catalog gen-config' to generate a
documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml; relative paths in it resolve here
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Snapshot file (overrides data_file from config.toml)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all users
    Users,
    /// Create a new user
    CreateUser { username: String },
    /// Delete a user with all their albums
    DeleteUser { username: String },
    /// Log in as a user and list their albums
    Login { username: String },
    /// Show the photos of one album
    Show { username: String, album: String },
    /// Create an empty album
    CreateAlbum { username: String, album: String },
    /// Rename an album
    RenameAlbum {
        username: String,
        album: String,
        new_name: String,
    },
    /// Delete an album and its photo records
    DeleteAlbum { username: String, album: String },
    /// Add an image file to an album
    AddPhoto {
        username: String,
        album: String,
        file: PathBuf,
    },
    /// Move a photo between two albums of the same user
    Move {
        username: String,
        from: String,
        to: String,
        image: String,
    },
    /// Copy a photo into another album of the same user
    Copy {
        username: String,
        from: String,
        to: String,
        image: String,
    },
    /// Remove a photo from one album
    Remove {
        username: String,
        album: String,
        image: String,
    },
    /// Set the caption of an image everywhere it appears
    Caption { image: String, caption: String },
    /// Add, remove, or list tags
    #[command(subcommand)]
    Tag(TagCommand),
    /// Manage tag types
    #[command(subcommand)]
    TagType(TagTypeCommand),
    /// Search photos across all users
    Search {
        /// Save the matches as a new album with this name
        #[arg(long, requires = "user")]
        save_as: Option<String>,
        /// Owner of the album created by --save-as
        #[arg(long)]
        user: Option<String>,
        #[command(subcommand)]
        by: SearchBy,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum TagCommand {
    /// Tag a photo; every other record of the same image gets the tag too
    Add {
        username: String,
        album: String,
        image: String,
        #[arg(value_parser = parse_tag)]
        tag: Tag,
    },
    /// Remove a tag from every record of an image
    Remove {
        image: String,
        #[arg(value_parser = parse_tag)]
        tag: Tag,
    },
    /// List the tags of an image across all its records
    List { image: String },
}

#[derive(Subcommand)]
enum TagTypeCommand {
    /// List known tag types
    List,
    /// Register a new tag type
    Add {
        name: String,
        /// Allow at most one tag of this type per photo
        #[arg(long)]
        restricted: bool,
    },
}

#[derive(Subcommand)]
enum SearchBy {
    /// Photos dated within FROM..=TO (YYYY-MM-DD)
    Date { from: NaiveDate, to: NaiveDate },
    /// Photos with a tag
    Tag {
        #[arg(value_parser = parse_tag)]
        tag: Tag,
    },
    /// Photos with both tags
    And {
        #[arg(value_parser = parse_tag)]
        first: Tag,
        #[arg(value_parser = parse_tag)]
        second: Tag,
    },
    /// Photos with either tag
    Or {
        #[arg(value_parser = parse_tag)]
        first: Tag,
        #[arg(value_parser = parse_tag)]
        second: Tag,
    },
}

impl SearchBy {
    fn into_query(self) -> Query {
        match self {
            SearchBy::Date { from, to } => Query::DateRange {
                start: from,
                end: to,
            },
            SearchBy::Tag { tag } => Query::Tag(tag),
            SearchBy::And { first, second } => Query::And(first, second),
            SearchBy::Or { first, second } => Query::Or(first, second),
        }
    }
}

/// Parse `TYPE=VALUE`.
fn parse_tag(s: &str) -> Result<Tag, String> {
    let (tag_type, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=VALUE, got '{s}'"))?;
    if tag_type.trim().is_empty() || value.trim().is_empty() {
        return Err(format!("tag type and value must not be empty in '{s}'"));
    }
    Ok(Tag::new(tag_type.trim(), value.trim()))
}

/// Accept either a `file://` URI or a filesystem path.
fn image_key(arg: &str) -> String {
    if arg.starts_with("file://") {
        arg.to_string()
    } else {
        scan::image_uri(Path::new(arg))
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "photo_catalog=debug"
    } else {
        "photo_catalog=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.config_dir)?;
    let data_path = cli
        .data
        .clone()
        .unwrap_or_else(|| config.data_path(&cli.config_dir));
    let first_run = !data_path.exists();
    let store = JsonFileStore::new(data_path).with_seed(config.seed(&cli.config_dir));
    let mut catalog = Catalog::open(store)?;
    if first_run {
        // Pin the seeded state so later runs don't rescan the stock directory.
        catalog.save()?;
    }

    match cli.command {
        Command::Users => output::print_users(catalog.users()),
        Command::CreateUser { username } => {
            catalog.create_user(&username)?;
            println!("Created user {username}");
        }
        Command::DeleteUser { username } => {
            let removed = catalog.delete_user(&username)?;
            println!(
                "Deleted user {} ({} albums)",
                removed.username(),
                removed.albums().len()
            );
        }
        Command::Login { username } => {
            let user = catalog.login(&username)?;
            output::print_user(user);
        }
        Command::Show { username, album } => {
            output::print_album(catalog.album(&username, &album)?);
        }
        Command::CreateAlbum { username, album } => {
            catalog.create_album(&username, &album)?;
            println!("Created album {album}");
        }
        Command::RenameAlbum {
            username,
            album,
            new_name,
        } => {
            catalog.rename_album(&username, &album, &new_name)?;
            println!("Renamed album {album} to {new_name}");
        }
        Command::DeleteAlbum { username, album } => {
            let removed = catalog.delete_album(&username, &album)?;
            println!("Deleted album {} ({} photos)", removed.name(), removed.len());
        }
        Command::AddPhoto {
            username,
            album,
            file,
        } => {
            let photo = scan::photo_from_file(&file)?;
            let image_path = photo.image_path().to_string();
            let outcome = catalog.add_photo(&username, &album, photo)?;
            println!("Added {image_path}");
            if outcome.inherited {
                println!("    Caption and tags copied from existing record");
            }
        }
        Command::Move {
            username,
            from,
            to,
            image,
        } => {
            catalog.move_photo(&username, &from, &to, &image_key(&image))?;
            println!("Moved {image} to {to}");
        }
        Command::Copy {
            username,
            from,
            to,
            image,
        } => {
            catalog.copy_photo(&username, &from, &to, &image_key(&image))?;
            println!("Copied {image} to {to}");
        }
        Command::Remove {
            username,
            album,
            image,
        } => {
            catalog.remove_photo(&username, &album, &image_key(&image))?;
            println!("Removed {image} from {album}");
        }
        Command::Caption { image, caption } => {
            let updated = catalog.set_caption(&image_key(&image), &caption)?;
            println!("Captioned {updated} records");
        }
        Command::Tag(TagCommand::Add {
            username,
            album,
            image,
            tag,
        }) => {
            let outcome = catalog.add_tag(&username, &album, &image_key(&image), tag)?;
            println!("Tagged {} records", outcome.applied);
            if outcome.skipped_restricted > 0 {
                println!(
                    "    Skipped {} records holding another tag of the same restricted type",
                    outcome.skipped_restricted
                );
            }
        }
        Command::Tag(TagCommand::Remove { image, tag }) => {
            let removed = catalog.remove_tag(&image_key(&image), &tag)?;
            println!("Removed {tag} from {removed} records");
        }
        Command::Tag(TagCommand::List { image }) => {
            let key = image_key(&image);
            output::print_image_tags(&key, &catalog.tags_for_image(&key));
        }
        Command::TagType(TagTypeCommand::List) => output::print_tag_types(catalog.tag_types()),
        Command::TagType(TagTypeCommand::Add { name, restricted }) => {
            catalog.register_tag_type(&name, restricted)?;
            println!("Registered tag type {name}");
        }
        Command::Search { save_as, user, by } => {
            let query = by.into_query();
            output::print_search_results(&catalog.search(&query)?);
            if let (Some(album), Some(username)) = (save_as, user) {
                let count = catalog.create_album_from_search(&username, &album, &query)?;
                println!("Saved {count} photos to album {album}");
            }
        }
        Command::GenConfig => {}
    }

    Ok(())
}
