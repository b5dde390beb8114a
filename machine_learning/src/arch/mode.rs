use std::fmt;

/// Execution mode of a model. Layers such as `Dropout` only perturb their input while training.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Train,
    Eval,
}

/// Placement tag of a model's parameters.
///
/// Computation always runs on the host; an `Accelerator` tag only records where the owner of the
/// model intends to run it, and exporting a model normalizes it back to `Cpu`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    #[default]
    Cpu,
    Accelerator(usize),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Accelerator(idx) => write!(f, "accelerator:{idx}"),
        }
    }
}
