//! Dependency probes. Each one is side-effect free.

use narrator_core::domain::{KITTENTTS_PACKAGES, OPENTTS_IMAGE};
use narrator_core::{DependencyCheck, DependencyProbe};

use crate::paths::KittenTtsPaths;
use crate::process::{first_line, run};

pub(super) async fn probe(paths: &KittenTtsPaths, probe: DependencyProbe) -> DependencyCheck {
    let label = probe.label();
    match probe {
        DependencyProbe::PythonInstalled => python_installed(label).await,
        DependencyProbe::KittenVenv => kitten_venv(paths, label),
        DependencyProbe::KittenPackages => kitten_packages(paths, label).await,
        DependencyProbe::KittenScript => kitten_script(paths, label),
        DependencyProbe::DockerInstalled => docker_installed(label).await,
        DependencyProbe::DockerRunning => docker_running(label).await,
        DependencyProbe::OpenTtsImage => opentts_image(label).await,
    }
}

// ── KittenTTS ──────────────────────────────────────────────────────

async fn python_installed(label: &str) -> DependencyCheck {
    match run("python3", ["--version"]).await {
        Ok(output) if output.success => {
            // Older interpreters print the version on stderr.
            let version = first_line(&output.stdout)
                .or_else(|| first_line(&output.stderr))
                .unwrap_or("python3");
            DependencyCheck::passed(label, version)
        }
        _ => DependencyCheck::failed(
            label,
            "Python 3.10+ is required for KittenTTS",
            "sudo apt install python3 python3-venv",
        ),
    }
}

fn kitten_venv(paths: &KittenTtsPaths, label: &str) -> DependencyCheck {
    match paths.venv_dir() {
        Some(dir) => DependencyCheck::passed(label, dir.display().to_string()),
        None => DependencyCheck::failed(
            label,
            "No .venv directory next to the server script",
            "narrator server setup kittentts",
        ),
    }
}

async fn kitten_packages(paths: &KittenTtsPaths, label: &str) -> DependencyCheck {
    let Some(python) = paths.venv_python() else {
        return DependencyCheck::failed(
            label,
            "Virtual environment not found, create it first",
            "narrator server setup kittentts",
        );
    };

    let imports = KITTENTTS_PACKAGES
        .iter()
        .map(|package| format!("import {package}"))
        .collect::<Vec<_>>()
        .join("; ");

    match run(&python, ["-c", imports.as_str()]).await {
        Ok(output) if output.success => {
            DependencyCheck::passed(label, KITTENTTS_PACKAGES.join(", "))
        }
        Ok(output) => {
            let missing = KITTENTTS_PACKAGES
                .iter()
                .find(|package| output.stderr.contains(*package))
                .map_or_else(|| "some packages".to_string(), |p| (*p).to_string());
            DependencyCheck::failed(
                label,
                format!("Missing {missing}: {}", output.error_line("import failed")),
                format!("pip install {}", KITTENTTS_PACKAGES.join(" ")),
            )
        }
        Err(e) => DependencyCheck::failed(
            label,
            format!("Could not run the venv interpreter: {e}"),
            "Recreate the virtual environment",
        ),
    }
}

fn kitten_script(paths: &KittenTtsPaths, label: &str) -> DependencyCheck {
    match paths.script() {
        Some(path) => DependencyCheck::passed(label, path.display().to_string()),
        None => DependencyCheck::failed(
            label,
            format!("Not found in {}", paths.describe_script_search()),
            "Reinstall the application",
        ),
    }
}

// ── OpenTTS ────────────────────────────────────────────────────────

async fn docker_installed(label: &str) -> DependencyCheck {
    match run("docker", ["--version"]).await {
        Ok(output) if output.success => {
            DependencyCheck::passed(label, output.stdout_trimmed().to_string())
        }
        _ => DependencyCheck::failed(
            label,
            "Docker is required to run OpenTTS",
            "sudo apt install docker.io && sudo usermod -aG docker $USER",
        ),
    }
}

async fn docker_running(label: &str) -> DependencyCheck {
    match run("docker", ["info"]).await {
        Ok(output) if output.success => DependencyCheck::passed(label, "Docker daemon is active"),
        Ok(output) => {
            let hint = if output.stderr.contains("permission denied") {
                "sudo usermod -aG docker $USER && newgrp docker"
            } else {
                "sudo systemctl start docker"
            };
            DependencyCheck::failed(
                label,
                output.error_line("Docker daemon is not active"),
                hint,
            )
        }
        Err(_) => DependencyCheck::failed(
            label,
            "Could not communicate with Docker",
            "sudo systemctl start docker",
        ),
    }
}

async fn opentts_image(label: &str) -> DependencyCheck {
    let pull_hint = format!("docker pull {OPENTTS_IMAGE}");
    match run("docker", ["images", "-q", OPENTTS_IMAGE]).await {
        Ok(output) if output.success => {
            let id = output.stdout_trimmed();
            if id.is_empty() {
                DependencyCheck::failed(
                    label,
                    format!("Image {OPENTTS_IMAGE} is not pulled"),
                    pull_hint,
                )
            } else {
                DependencyCheck::passed(label, format!("Image ID: {id}"))
            }
        }
        _ => DependencyCheck::failed(label, "Docker may not be running", pull_hint),
    }
}
