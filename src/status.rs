//! Measurement faults and the status shown to the display.

/// Why a cycle produced no usable reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Fault {
    /// No complete echo before the timeout: nothing in range, or a missing
    /// falling edge.
    NoEcho,
    /// Echo decoded to a distance outside the rated range.
    OutOfRange,
    /// Too many failed cycles in a row.
    SensorUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Status {
    Ok,
    Fault(Fault),
}

impl Status {
    pub const NO_ECHO: Status = Status::Fault(Fault::NoEcho);
    pub const OUT_OF_RANGE: Status = Status::Fault(Fault::OutOfRange);
    pub const SENSOR_UNAVAILABLE: Status = Status::Fault(Fault::SensorUnavailable);

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Fault(Fault::NoEcho) => "NO ECHO",
            Status::Fault(Fault::OutOfRange) => "OUT OF RANGE",
            Status::Fault(Fault::SensorUnavailable) => "SENSOR N/A",
        }
    }

    pub(crate) fn to_bits(self) -> u8 {
        match self {
            Status::Ok => 0,
            Status::Fault(Fault::NoEcho) => 1,
            Status::Fault(Fault::OutOfRange) => 2,
            Status::Fault(Fault::SensorUnavailable) => 3,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Status::NO_ECHO,
            2 => Status::OUT_OF_RANGE,
            3 => Status::SENSOR_UNAVAILABLE,
            _ => Status::Ok,
        }
    }
}

impl From<Fault> for Status {
    fn from(fault: Fault) -> Self {
        Status::Fault(fault)
    }
}
