use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use dataio_core::{BackendRegistry, DataNode, Scalar, StorageConfig};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "dataio",
    about = "Dump, query and edit hierarchical data files through dotted paths",
    version
)]
struct Cli {
    /// Directory relative storage paths are resolved against
    #[arg(long, global = true, env = "DATAIO_BASE_PATH")]
    base_path: Option<PathBuf>,
    /// Output format for serialized data
    #[arg(long, global = true, value_enum, default_value_t = Format::Json)]
    format: Format,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn backend(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Load a file or directory and print it serialized
    Dump(DumpArgs),
    /// Print the scalar or subtree at a path
    Get(QueryArgs),
    /// Print the element count of the list at a path
    Size(QueryArgs),
    /// List loadable entries in a directory
    List(ListArgs),
    /// Set a scalar at a key path; prints or writes with --out
    Set(SetArgs),
}

#[derive(ClapArgs, Debug)]
struct DumpArgs {
    /// Storage path (file, entry name or directory)
    path: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct QueryArgs {
    /// Storage path (file, entry name or directory)
    path: PathBuf,
    /// Dotted path, e.g. server.ports.0
    #[arg(long, default_value = "")]
    at: String,
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// Directory to list (defaults to the base path)
    path: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct SetArgs {
    /// Storage path (file or entry name)
    path: PathBuf,
    /// Dotted key path; its parent must exist
    #[arg(long)]
    at: String,
    /// New value: true/false, a number, or any other text as a string
    #[arg(long)]
    value: String,
    /// Optional output path to write; otherwise prints to stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = StorageConfig::from_env();
    if let Some(base) = cli.base_path.clone() {
        config.base_path = base;
    }
    config.default_backend = cli.format.backend().to_string();
    let registry = BackendRegistry::with_default_backends(config);

    match cli.cmd {
        Cmd::Dump(a) => cmd_dump(&registry, a),
        Cmd::Get(a) => cmd_get(&registry, a),
        Cmd::Size(a) => cmd_size(&registry, a),
        Cmd::List(a) => cmd_list(&registry, a),
        Cmd::Set(a) => cmd_set(&registry, a),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load(registry: &BackendRegistry, path: &Path) -> DataNode {
    registry.try_load_storage(path).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(2);
    })
}

fn print_serialized(registry: &BackendRegistry, data: &DataNode) {
    match registry.try_serialize(data) {
        Ok(s) => println!("{}", s.trim_end()),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(5);
        }
    }
}

fn cmd_dump(registry: &BackendRegistry, args: DumpArgs) {
    let data = load(registry, &args.path);
    print_serialized(registry, &data);
}

fn cmd_get(registry: &BackendRegistry, args: QueryArgs) {
    let data = load(registry, &args.path);
    match data.try_get_sub(args.at.as_str()) {
        Ok(DataNode::Scalar(Scalar::String(s))) => println!("{}", s),
        Ok(DataNode::Scalar(s)) => println!("{}", s),
        Ok(sub) => print_serialized(registry, sub),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(3);
        }
    }
}

fn cmd_size(registry: &BackendRegistry, args: QueryArgs) {
    let data = load(registry, &args.path);
    println!("{}", data.get_list_size(args.at.as_str()));
}

fn cmd_list(registry: &BackendRegistry, args: ListArgs) {
    match registry.try_list_entries(args.path.unwrap_or_default()) {
        Ok(names) => {
            for n in names {
                println!("{}", n);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    }
}

fn parse_value(raw: &str) -> Result<DataNode, dataio_core::DataError> {
    match raw {
        "true" => Ok(DataNode::boolean(true)),
        "false" => Ok(DataNode::boolean(false)),
        _ => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(DataNode::number(n)),
            _ => DataNode::string(raw),
        },
    }
}

fn cmd_set(registry: &BackendRegistry, args: SetArgs) {
    let mut data = load(registry, &args.path);
    let value = parse_value(&args.value).unwrap_or_else(|e| {
        eprintln!("invalid --value: {}", e);
        std::process::exit(4);
    });
    if let Err(e) = data.try_insert(Some(args.at.as_str()), value) {
        eprintln!("error: {}", e);
        std::process::exit(4);
    }
    if let Some(out) = args.out {
        match registry.save_storage(&data, &out) {
            Ok(written) => eprintln!("wrote {}", written.display()),
            Err(e) => {
                eprintln!("error writing: {}", e);
                std::process::exit(5);
            }
        }
    } else {
        print_serialized(registry, &data);
    }
}
