// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// One subcommand per analysis tool. Each *Args struct converts
// into its application-layer config, so the use cases never see
// clap types.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{
    montage_use_case::{MontageConfig, MontageLayout},
    ratio_extract_use_case::RatioExtractConfig,
    ratio_hist_use_case::RatioHistConfig,
    train_use_case::{ComputeDevice, TrainConfig},
};
use crate::data::binning::BinSpec;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the particle / energy network on HDF5 shower files
    Train(TrainArgs),

    /// Tile deadtime comparison snapshots into rows and stacks
    Combine(CombineArgs),

    /// Tile the snapshots drawn with reference circles
    CombineCircles(CombineCirclesArgs),

    /// Turn exported ratio maps into the ratio-vs-radius graph table
    RatioExtract(RatioExtractArgs),

    /// Bin ratio-vs-radius graphs and plot them per deadtime
    RatioHist(RatioHistArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DeviceArg {
    Gpu,
    Cpu,
}

impl From<DeviceArg> for ComputeDevice {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Gpu => ComputeDevice::Gpu,
            DeviceArg::Cpu => ComputeDevice::Cpu,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding one `<particle>_<tag>_<events>.h5` file per species
    #[arg(long, default_value = ".")]
    pub data_dir: String,

    /// Energy range tag in the file names
    #[arg(long, default_value = "E1-100")]
    pub energy_tag: String,

    /// Event count in the file names
    #[arg(long, default_value_t = 2000)]
    pub events_per_file: usize,

    #[arg(long, default_value_t = 57)]
    pub image_height: usize,

    #[arg(long, default_value_t = 49)]
    pub image_width: usize,

    /// Directory for the best checkpoint, config and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Directory for the loss and prediction plots
    #[arg(long, default_value = ".")]
    pub plot_dir: String,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Upper bound; early stopping may end training sooner
    #[arg(long, default_value_t = 25)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = 6)]
    pub patience: usize,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// Seed for the data shuffle; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = DeviceArg::Gpu)]
    pub device: DeviceArg,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:        a.data_dir,
            energy_tag:      a.energy_tag,
            events_per_file: a.events_per_file,
            image_height:    a.image_height,
            image_width:     a.image_width,
            checkpoint_dir:  a.checkpoint_dir,
            plot_dir:        a.plot_dir,
            batch_size:      a.batch_size,
            epochs:          a.epochs,
            learning_rate:   a.lr,
            patience:        a.patience,
            dropout:         a.dropout,
            seed:            a.seed,
            device:          a.device.into(),
        }
    }
}

/// Options shared by both montage commands.
#[derive(Args, Debug)]
pub struct MontageDirs {
    /// Directory holding the snapshot panels
    #[arg(long, default_value = ".")]
    pub input_dir: String,

    /// Directory for the combined images
    #[arg(long, default_value = ".")]
    pub output_dir: String,

    /// Sensor sizes to combine, in row order
    #[arg(long, value_delimiter = ',')]
    pub sizes: Option<Vec<u32>>,
}

impl MontageDirs {
    fn apply(self, mut cfg: MontageConfig) -> MontageConfig {
        cfg.input_dir  = self.input_dir;
        cfg.output_dir = self.output_dir;
        if let Some(sizes) = self.sizes {
            cfg.sizes = sizes;
        }
        cfg
    }
}

#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Deadtime in ns, as it appears in the panel names
    #[arg(long, default_value_t = 30.0)]
    pub deadtime: f64,

    #[command(flatten)]
    pub dirs: MontageDirs,
}

impl From<CombineArgs> for MontageConfig {
    fn from(a: CombineArgs) -> Self {
        let cfg = MontageConfig { deadtime_ns: a.deadtime, ..MontageConfig::comparison() };
        a.dirs.apply(cfg)
    }
}

#[derive(Args, Debug)]
pub struct CombineCirclesArgs {
    #[arg(long, default_value_t = 5.0)]
    pub deadtime: f64,

    /// Radius of the first reference circle
    #[arg(long, default_value_t = 40.0)]
    pub circle1: f64,

    /// Radius of the second reference circle
    #[arg(long, default_value_t = 20.0)]
    pub circle2: f64,

    #[command(flatten)]
    pub dirs: MontageDirs,
}

impl From<CombineCirclesArgs> for MontageConfig {
    fn from(a: CombineCirclesArgs) -> Self {
        let cfg = MontageConfig {
            layout:      MontageLayout::Circles { circle1: a.circle1, circle2: a.circle2 },
            deadtime_ns: a.deadtime,
            ..MontageConfig::circles()
        };
        a.dirs.apply(cfg)
    }
}

#[derive(Args, Debug)]
pub struct RatioExtractArgs {
    /// Directory holding `RatioHistograms_Deadtime{D}ns_{G}x{G}.csv` maps
    #[arg(long, default_value = "ana_datas")]
    pub input_dir: String,

    #[arg(long, default_value = "RatioVsRadius.csv")]
    pub output: String,

    #[arg(long, value_delimiter = ',', default_value = "0,5,10,30")]
    pub deadtimes: Vec<f64>,

    #[arg(long, value_delimiter = ',', default_value = "100,50,25,20")]
    pub grid_sizes: Vec<u32>,

    /// Beam spot x in metres
    #[arg(long, default_value_t = -4.16, allow_negative_numbers = true)]
    pub center_x: f64,

    /// Beam spot y in metres
    #[arg(long, default_value_t = 4.527, allow_negative_numbers = true)]
    pub center_y: f64,

    /// Cells farther than this from the beam spot are dropped, in metres
    #[arg(long, default_value_t = 0.05)]
    pub max_distance: f64,
}

impl From<RatioExtractArgs> for RatioExtractConfig {
    fn from(a: RatioExtractArgs) -> Self {
        RatioExtractConfig {
            input_dir:    a.input_dir,
            output:       a.output,
            deadtimes:    a.deadtimes,
            grid_sizes:   a.grid_sizes,
            center_x:     a.center_x,
            center_y:     a.center_y,
            max_distance: a.max_distance,
        }
    }
}

#[derive(Args, Debug)]
pub struct RatioHistArgs {
    /// CSV export of the graphs (`graph,distance,ratio`)
    #[arg(long, default_value = "RatioVsRadius.csv")]
    pub input: String,

    #[arg(long, default_value = "RatioVsRadius_Histograms")]
    pub output_dir: String,

    #[arg(long, default_value_t = 20)]
    pub bins: usize,

    /// Lower edge of the distance axis in metres
    #[arg(long, default_value_t = 0.0015)]
    pub min_distance: f64,

    /// Upper edge of the distance axis in metres
    #[arg(long, default_value_t = 0.0415)]
    pub max_distance: f64,
}

impl From<RatioHistArgs> for RatioHistConfig {
    fn from(a: RatioHistArgs) -> Self {
        RatioHistConfig {
            input:      a.input,
            output_dir: a.output_dir,
            bins:       BinSpec { n_bins: a.bins, lo: a.min_distance, hi: a.max_distance },
        }
    }
}
