use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3, Vec4Swizzles};
use scenery_camera::{Camera, CameraRig, OrbitSettings};
use scenery_input::{InputEvent, PointerButton, Viewport};
use scenery_render::{
    DemoScene, FrameAcquisitionError, FrameOutcome, FrameRenderer, PipelineStatus,
    RecordingBackend, RendererConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scenery-cli", about = "Headless tooling for the scenery renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Project a world-space point through a camera
    Project {
        /// Camera position as x,y,z
        #[arg(long, default_value = "0,0,5", value_parser = parse_vec3, allow_hyphen_values = true)]
        eye: Vec3,
        /// Look-at target as x,y,z
        #[arg(long, default_value = "0,0,0", value_parser = parse_vec3, allow_hyphen_values = true)]
        target: Vec3,
        /// World-space point as x,y,z
        #[arg(long, default_value = "0,0,0", value_parser = parse_vec3, allow_hyphen_values = true)]
        point: Vec3,
        /// Vertical field of view in degrees
        #[arg(long, default_value = "60")]
        fov: f32,
        /// Use an orthographic projection with this half-height instead
        #[arg(long)]
        ortho: Option<f32>,
        #[arg(long, default_value = "800")]
        width: u32,
        #[arg(long, default_value = "600")]
        height: u32,
    },
    /// Simulate the orbit controller after one drag gesture
    Orbit {
        /// Number of update ticks
        #[arg(short, long, default_value = "10")]
        ticks: u32,
        /// Primary-button drag in pixels as dx,dy
        #[arg(long, default_value = "100,0", value_parser = parse_vec2, allow_hyphen_values = true)]
        drag: Vec2,
        /// Wheel notches, positive zooms in
        #[arg(long, default_value = "0")]
        zoom: f32,
        /// Seconds per tick
        #[arg(long, default_value = "0.016")]
        dt: f32,
        #[arg(long)]
        damping: bool,
        #[arg(long)]
        auto_rotate: bool,
    },
    /// Render the demo scene through the recording backend and dump commands
    Frame {
        /// Number of frames to render
        #[arg(short, long, default_value = "1")]
        frames: u32,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// Keep demo materials compiling
        #[arg(long)]
        compiling: bool,
        /// Simulate an unavailable output image
        #[arg(long)]
        no_image: bool,
    },
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f32; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated numbers, got '{s}'"));
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("invalid number '{part}': {e}"))?;
    }
    Ok(out)
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    parse_floats::<3>(s).map(Vec3::from)
}

fn parse_vec2(s: &str) -> Result<Vec2, String> {
    parse_floats::<2>(s).map(Vec2::from)
}

struct FrameArgs {
    frames: u32,
    width: u32,
    height: u32,
    compiling: bool,
    no_image: bool,
}

struct FrameRun {
    outcomes: Vec<FrameOutcome>,
    dump: String,
}

/// Render the demo scene through a [`RecordingBackend`] and return each
/// frame's outcome plus a dump of the last submission.
fn render_demo(args: &FrameArgs) -> anyhow::Result<FrameRun> {
    let mut renderer = FrameRenderer::new(
        RecordingBackend::new(args.width, args.height),
        RendererConfig::default(),
    );
    renderer.initialize()?;
    if args.compiling {
        renderer.backend_mut().new_pipeline_status = PipelineStatus::Compiling;
    }
    let demo = DemoScene::build(&mut renderer)?;
    if args.no_image {
        renderer.backend_mut().fail_acquire = Some(FrameAcquisitionError::Timeout);
    }

    let mut rig = CameraRig::perspective(
        Vec3::new(6.0, 4.0, 8.0),
        Vec3::ZERO,
        60.0_f32.to_radians(),
        0.1,
        1000.0,
    );
    let outcomes: Vec<FrameOutcome> = (0..args.frames)
        .map(|i| renderer.render_frame_at(&demo.scene, &mut rig, i as f32 / 60.0))
        .collect();
    let submitted = outcomes.iter().filter(|o| o.is_submitted()).count();
    tracing::info!(
        frames = args.frames,
        submitted,
        width = args.width,
        height = args.height,
        "demo frames rendered"
    );
    let dump = renderer.backend().dump();

    demo.release(&mut renderer);
    renderer.dispose();
    Ok(FrameRun { outcomes, dump })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Info => {
            println!("scenery-cli v{}", env!("CARGO_PKG_VERSION"));
            let rig = CameraRig::default();
            println!(
                "camera: default eye={} target={} near={} far={}",
                rig.position(),
                rig.target(),
                rig.near(),
                rig.far()
            );
            println!("orbit: {:?}", OrbitSettings::default());
            println!("renderer: {:?}", RendererConfig::default());
            println!("bind slots: frame=0 object=1 material=2");
        }
        Commands::Project {
            eye,
            target,
            point,
            fov,
            ortho,
            width,
            height,
        } => {
            let mut rig = match ortho {
                Some(extent) => CameraRig::orthographic(eye, target, extent, 0.1, 1000.0),
                None => CameraRig::perspective(eye, target, fov.to_radians(), 0.1, 1000.0),
            };
            rig.on_output_resized(width, height);
            let clip = rig.view_projection_matrix() * point.extend(1.0);
            let ndc = clip.xyz() / clip.w;
            let visible = clip.w > 0.0
                && ndc.x.abs() <= 1.0
                && ndc.y.abs() <= 1.0
                && (0.0..=1.0).contains(&ndc.z);
            println!("view: {:?}", rig.view_matrix().transform_point3(point));
            println!(
                "clip: ({:.4}, {:.4}, {:.4}, {:.4})",
                clip.x, clip.y, clip.z, clip.w
            );
            println!("ndc:  ({:.4}, {:.4}, {:.4})", ndc.x, ndc.y, ndc.z);
            println!("inside frustum: {visible}");
        }
        Commands::Orbit {
            ticks,
            drag,
            zoom,
            dt,
            damping,
            auto_rotate,
        } => {
            let viewport = Viewport::new(800.0, 600.0);
            let mut camera = Camera::new(CameraRig::default());
            let settings = OrbitSettings {
                damping_enabled: damping,
                auto_rotate,
                ..OrbitSettings::default()
            };
            camera.attach_orbit().settings = settings;

            if let Some((orbit, rig)) = camera.orbit_mut() {
                let drag = InputEvent::Drag {
                    button: PointerButton::Primary,
                    delta: drag,
                };
                orbit.handle_input(&drag, viewport, rig);
                orbit.handle_input(&InputEvent::Wheel { notches: zoom }, viewport, rig);
            }

            println!("tick  position                      radius  phi     theta");
            for tick in 1..=ticks {
                camera.update(dt);
                let p = camera.rig.position();
                if let Some(orbit) = camera.orbit() {
                    let s = orbit.spherical();
                    println!(
                        "{tick:>4}  ({:>7.3}, {:>7.3}, {:>7.3})  {:>6.3}  {:>6.3}  {:>6.3}",
                        p.x, p.y, p.z, s.radius, s.phi, s.theta
                    );
                }
            }
        }
        Commands::Frame {
            frames,
            width,
            height,
            compiling,
            no_image,
        } => {
            let run = render_demo(&FrameArgs {
                frames,
                width,
                height,
                compiling,
                no_image,
            })?;
            for (i, outcome) in run.outcomes.iter().enumerate() {
                match outcome {
                    FrameOutcome::Submitted(stats) => println!(
                        "frame {}: {} draws, {} skipped (missing), {} skipped (not ready)",
                        i + 1,
                        stats.draws,
                        stats.skipped_missing,
                        stats.skipped_not_ready
                    ),
                    FrameOutcome::NoImage(e) => println!("frame {}: no image ({e})", i + 1),
                    FrameOutcome::NotRunning => println!("frame {}: renderer not running", i + 1),
                }
            }
            print!("{}", run.dump);
        }
    }

    Ok(())
}
