// ============================================================
// Layer 4 — Shower Loader
// ============================================================
// Loads simulated calorimeter showers from HDF5 files.
//
// File layout (one file per particle species):
//   <data_dir>/e+_E1-100_2000.h5
//     └── group "e+_E1-100_2000"
//           ├── beamE        [N]         beam energy per event
//           └── hist2d_data  [N, H, W]   hit histogram per event
//
// HDF5 access links against the system HDF5 library, so it is
// compiled only with the `hdf5` cargo feature.

use anyhow::{ensure, Result};
use std::path::PathBuf;

use crate::data::dataset::ShowerSample;
use crate::domain::{particle::ParticleKind, traits::ShowerSource};

/// All events of one particle species, as stored on disk.
#[derive(Debug, Clone)]
pub struct ParticleShowers {
    pub particle:    ParticleKind,
    pub beam_energy: Vec<f32>,
    /// One row-major H×W histogram per event.
    pub images:      Vec<Vec<f32>>,
}

impl ParticleShowers {
    pub fn event_count(&self) -> usize {
        self.beam_energy.len()
    }
}

/// Loads `<stem>.h5` files where `stem = ParticleKind::dataset_stem`.
pub struct Hdf5ShowerLoader {
    dir:          PathBuf,
    energy_tag:   String,
    events:       usize,
    image_height: usize,
    image_width:  usize,
}

impl Hdf5ShowerLoader {
    pub fn new(
        dir:          impl Into<PathBuf>,
        energy_tag:   impl Into<String>,
        events:       usize,
        image_height: usize,
        image_width:  usize,
    ) -> Self {
        Self {
            dir: dir.into(),
            energy_tag: energy_tag.into(),
            events,
            image_height,
            image_width,
        }
    }

    fn file_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.h5"))
    }
}

impl ShowerSource for Hdf5ShowerLoader {
    #[cfg(feature = "hdf5")]
    fn load_particle(&self, particle: ParticleKind) -> Result<ParticleShowers> {
        use anyhow::Context;

        let stem = particle.dataset_stem(&self.energy_tag, self.events);
        let path = self.file_path(&stem);

        let file = hdf5::File::open(&path)
            .with_context(|| format!("Cannot open shower file '{}'", path.display()))?;
        let group = file
            .group(&stem)
            .with_context(|| format!("Group '{stem}' not found in '{}'", path.display()))?;

        let beam_energy: Vec<f64> = group
            .dataset("beamE")
            .and_then(|ds| ds.read_raw::<f64>())
            .with_context(|| format!("Cannot read '{stem}/beamE'"))?;

        let hist = group
            .dataset("hist2d_data")
            .with_context(|| format!("Cannot open '{stem}/hist2d_data'"))?;
        let shape = hist.shape();
        let raw: Vec<f64> = hist
            .read_raw::<f64>()
            .with_context(|| format!("Cannot read '{stem}/hist2d_data'"))?;

        tracing::debug!(
            "Read {} events of {} from '{}' (shape {:?})",
            beam_energy.len(), particle, path.display(), shape
        );

        showers_from_raw(
            particle,
            beam_energy.into_iter().map(|e| e as f32).collect(),
            raw.into_iter().map(|v| v as f32).collect(),
            &shape,
            self.image_height,
            self.image_width,
        )
    }

    #[cfg(not(feature = "hdf5"))]
    fn load_particle(&self, particle: ParticleKind) -> Result<ParticleShowers> {
        let stem = particle.dataset_stem(&self.energy_tag, self.events);
        anyhow::bail!(
            "Cannot read {}x{} showers from '{}': this binary was built without the `hdf5` feature",
            self.image_height,
            self.image_width,
            self.file_path(&stem).display()
        )
    }
}

/// Validate a flat `[N, H, W]` histogram block against the beam
/// energy column and split it into per-event images.
pub fn showers_from_raw(
    particle:    ParticleKind,
    beam_energy: Vec<f32>,
    raw:         Vec<f32>,
    shape:       &[usize],
    height:      usize,
    width:       usize,
) -> Result<ParticleShowers> {
    ensure!(
        shape == [beam_energy.len(), height, width],
        "{particle}: hist2d_data has shape {shape:?}, expected [{}, {height}, {width}]",
        beam_energy.len()
    );
    ensure!(
        raw.len() == beam_energy.len() * height * width,
        "{particle}: hist2d_data holds {} values, shape says {}",
        raw.len(),
        beam_energy.len() * height * width
    );

    let images = if height * width == 0 {
        vec![Vec::new(); beam_energy.len()]
    } else {
        raw.chunks_exact(height * width).map(<[f32]>::to_vec).collect()
    };

    Ok(ParticleShowers { particle, beam_energy, images })
}

/// Concatenate the showers of every species into labelled samples,
/// keeping the order in which the species are given.
pub fn build_samples(showers: Vec<ParticleShowers>) -> Vec<ShowerSample> {
    showers
        .into_iter()
        .flat_map(|s| {
            let label = s.particle.class_index();
            s.beam_energy
                .into_iter()
                .zip(s.images)
                .map(move |(energy, image)| ShowerSample::new(image, label, energy))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn showers(particle: ParticleKind, energies: &[f32], fill: f32) -> ParticleShowers {
        let n = energies.len();
        showers_from_raw(particle, energies.to_vec(), vec![fill; n * 6], &[n, 2, 3], 2, 3).unwrap()
    }

    #[test]
    fn test_raw_block_is_split_per_event() {
        let raw: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let s = showers_from_raw(ParticleKind::Electron, vec![1.0, 2.0], raw, &[2, 2, 3], 2, 3)
            .unwrap();
        assert_eq!(s.event_count(), 2);
        assert_eq!(s.images[0], vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(s.images[1], vec![6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let raw = vec![0.0; 12];
        // Wrong image size
        assert!(showers_from_raw(ParticleKind::Electron, vec![1.0, 2.0], raw.clone(), &[2, 3, 2], 2, 3).is_err());
        // Event count disagrees with beamE
        assert!(showers_from_raw(ParticleKind::Electron, vec![1.0], raw, &[2, 2, 3], 2, 3).is_err());
    }

    #[test]
    fn test_build_samples_labels_and_esum() {
        let samples = build_samples(vec![
            showers(ParticleKind::Positron, &[10.0, 20.0], 1.0),
            showers(ParticleKind::PiMinus, &[30.0], 0.5),
        ]);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].label, 0);
        assert_eq!(samples[1].label, 0);
        assert_eq!(samples[2].label, 3);
        assert_eq!(samples[0].esum, 6.0);
        assert_eq!(samples[2].esum, 3.0);
        assert_eq!(samples[2].beam_energy, 30.0);
    }

    #[cfg(not(feature = "hdf5"))]
    #[test]
    fn test_loader_without_hdf5_feature_reports_it() {
        let loader = Hdf5ShowerLoader::new("data", "E1-100", 2000, 57, 49);
        let err = loader.load_particle(ParticleKind::Positron).unwrap_err();
        assert!(err.to_string().contains("hdf5"));
        assert!(err.to_string().contains("e+_E1-100_2000.h5"));
        assert!(err.to_string().contains("57x49"));
    }
}
