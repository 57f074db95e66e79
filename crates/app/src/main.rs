//! Entry point for ageview.
//! Scans a resource root, then loads the requested assets through the
//! resources service and reports what was resolved.

use anyhow::{Result, bail};
use resources::{HeadlessGpu, Resources, ResourcesConfig};

/// One asset request from the command line.
#[derive(Debug, PartialEq)]
enum Request {
    Mesh(String),
    Texture(String),
    Cubemap(String),
    Program(String),
    Text(String),
}

#[derive(Debug, Default)]
struct Options {
    root: Option<String>,
    requests: Vec<Request>,
    list: bool,
    reload: bool,
    linear: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options> {
    // Accept: --resources=PATH --mesh=N --texture=N --cubemap=N --program=N
    //         --text=N --list --reload --linear
    let mut options = Options::default();
    for arg in args {
        if let Some(val) = arg.strip_prefix("--resources=") {
            options.root = Some(val.to_string());
        } else if let Some(val) = arg.strip_prefix("--mesh=") {
            options.requests.push(Request::Mesh(val.to_string()));
        } else if let Some(val) = arg.strip_prefix("--texture=") {
            options.requests.push(Request::Texture(val.to_string()));
        } else if let Some(val) = arg.strip_prefix("--cubemap=") {
            options.requests.push(Request::Cubemap(val.to_string()));
        } else if let Some(val) = arg.strip_prefix("--program=") {
            options.requests.push(Request::Program(val.to_string()));
        } else if let Some(val) = arg.strip_prefix("--text=") {
            options.requests.push(Request::Text(val.to_string()));
        } else if arg == "--list" {
            options.list = true;
        } else if arg == "--reload" {
            options.reload = true;
        } else if arg == "--linear" {
            options.linear = true;
        } else {
            bail!("Unknown argument '{}'", arg);
        }
    }
    Ok(options)
}

fn run(options: Options) -> Result<()> {
    let config = match &options.root {
        Some(root) => ResourcesConfig::with_root(root),
        None => ResourcesConfig::default(),
    };
    let mut resources = Resources::new(config, HeadlessGpu::new());

    if options.list {
        for name in resources.index().names() {
            println!("{}", name);
        }
    }

    let srgb = !options.linear;
    for request in &options.requests {
        match request {
            Request::Mesh(name) => match resources.get_mesh(name) {
                Some(mesh) => log::info!(
                    "Mesh {}: {} indices, bbox {:?}..{:?}, centroid {:?}",
                    name,
                    mesh.buffers.index_count,
                    mesh.bbox.min,
                    mesh.bbox.max,
                    mesh.centroid
                ),
                None => log::warn!("Mesh {} unavailable", name),
            },
            Request::Texture(name) => {
                if let Some(tex) = resources.get_texture(name, srgb) {
                    log::info!("Texture {}: {:?} {:?}", name, tex.id, tex.info);
                }
            }
            Request::Cubemap(name) => match resources.get_cubemap(name, srgb) {
                Some(tex) => log::info!("Cubemap {}: {:?} {:?}", name, tex.id, tex.info),
                None => log::warn!("Cubemap {} unavailable", name),
            },
            Request::Program(name) => match resources.get_program(name) {
                Some(program) => log::info!("Program {}: {:?}", name, program.id()),
                None => log::warn!("Program {} unavailable", name),
            },
            Request::Text(name) => println!("{}", resources.get_string(name)),
        }
    }

    if options.reload {
        resources.reload();
    }

    let gpu = resources.gpu();
    log::info!(
        "{} uploads, {} live objects ({} meshes, {} textures, {} programs), {} name conflicts.",
        gpu.upload_count(),
        gpu.live_objects(),
        gpu.live_meshes(),
        gpu.live_textures(),
        gpu.live_programs(),
        resources.index().conflicts().len()
    );

    resources.reset();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = parse_args(std::env::args().skip(1))?;
    log::info!(
        "Starting ageview. Resources: {}, {} requests",
        options.root.as_deref().unwrap_or("<default>"),
        options.requests.len()
    );

    run(options)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_requests_in_order() {
        let options = parse_args(args(&[
            "--resources=data/uru",
            "--mesh=rock",
            "--texture=stone",
            "--list",
        ]))
        .unwrap();
        assert_eq!(options.root.as_deref(), Some("data/uru"));
        assert_eq!(
            options.requests,
            vec![
                Request::Mesh("rock".to_string()),
                Request::Texture("stone".to_string())
            ]
        );
        assert!(options.list);
        assert!(!options.reload);
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(parse_args(args(&["--fullscreen"])).is_err());
    }
}
