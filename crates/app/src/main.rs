//! Entry point for objview.
//! Logging + GPU backend flag; everything else is fixed in `ViewerConfig`.

use anyhow::Result;
use corelib::config::ViewerConfig;

fn parse_backend(value: &str) -> Option<wgpu::Backends> {
    let backends = match value.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        _ => return None,
    };
    Some(backends)
}

fn parse_backend_arg(args: impl IntoIterator<Item = String>) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = parse_backend(val).unwrap_or_else(|| {
                log::warn!("Unknown backend '{}', falling back to auto.", val);
                wgpu::Backends::all()
            });
        }
    }
    backends
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let backends = parse_backend_arg(std::env::args().skip(1));
    let config = ViewerConfig::default();
    log::info!(
        "Starting objview. Backend: {:?}, mesh={}, objects={}, window_size={}x{}",
        backends,
        config.mesh_path.display(),
        config.object_count,
        config.window_width,
        config.window_height
    );

    platform::run(config, backends)?;

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
    fn backend_defaults_to_all() {
        assert_eq!(parse_backend_arg(args(&[])), wgpu::Backends::all());
    }

    #[test]
    fn backend_flag_is_case_insensitive() {
        assert_eq!(
            parse_backend_arg(args(&["--gpu-backend=Vulkan"])),
            wgpu::Backends::VULKAN
        );
        assert_eq!(
            parse_backend_arg(args(&["--gpu-backend=gles"])),
            wgpu::Backends::GL
        );
    }

    #[test]
    fn unknown_backend_falls_back_to_auto() {
        assert_eq!(
            parse_backend_arg(args(&["--gpu-backend=glide"])),
            wgpu::Backends::all()
        );
    }
}
