//! Common status codes shared by every platform subsystem.
//!
//! Errors are values: every operation returns a [`Status`] (or a
//! [`Result`] carrying one) and nothing in the platform panics on a
//! failure path. The enumeration is closed; adding a code means adding
//! its string mapping in the same change.

/// Result alias used across the OSAL and HAL crates.
pub type Result<T> = core::result::Result<T, Status>;

/// Outcome of a platform operation.
///
/// `Ok` is the distinguished success value; everything else is an error
/// and satisfies [`Status::is_error`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    Ok = 0,

    // General
    InvalidParam = 1,
    NullPointer = 2,
    NotSupported = 3,
    NotFound = 4,
    InvalidSize = 5,

    // State
    NotInitialized = 10,
    AlreadyInitialized = 11,
    InvalidState = 12,
    Busy = 13,
    Suspended = 14,

    // Resource
    NoMemory = 20,
    NoResource = 21,
    ResourceBusy = 22,
    Locked = 23,
    Full = 24,
    Empty = 25,

    // Timing
    Timeout = 30,
    WouldBlock = 31,

    // I/O
    Io = 40,
    Overrun = 41,
    Underrun = 42,
    Parity = 43,
    Framing = 44,
    Noise = 45,
    Nack = 46,
    Bus = 47,
    Arbitration = 48,

    // DMA
    Dma = 50,

    // Data
    NoData = 60,
    DataSize = 61,
    Crc = 62,
    Checksum = 63,

    // Permission
    PermissionDenied = 70,
    ReadOnly = 71,
}

impl Status {
    /// True for every code except `Ok`.
    #[inline]
    pub fn is_error(self) -> bool {
        self != Status::Ok
    }

    /// True only for `Ok`.
    #[inline]
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// Raw numeric code, stable across builds.
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Map a raw code back to its status, if it names one.
    pub fn from_code(code: u32) -> Option<Status> {
        let status = match code {
            0 => Status::Ok,
            1 => Status::InvalidParam,
            2 => Status::NullPointer,
            3 => Status::NotSupported,
            4 => Status::NotFound,
            5 => Status::InvalidSize,
            10 => Status::NotInitialized,
            11 => Status::AlreadyInitialized,
            12 => Status::InvalidState,
            13 => Status::Busy,
            14 => Status::Suspended,
            20 => Status::NoMemory,
            21 => Status::NoResource,
            22 => Status::ResourceBusy,
            23 => Status::Locked,
            24 => Status::Full,
            25 => Status::Empty,
            30 => Status::Timeout,
            31 => Status::WouldBlock,
            40 => Status::Io,
            41 => Status::Overrun,
            42 => Status::Underrun,
            43 => Status::Parity,
            44 => Status::Framing,
            45 => Status::Noise,
            46 => Status::Nack,
            47 => Status::Bus,
            48 => Status::Arbitration,
            50 => Status::Dma,
            60 => Status::NoData,
            61 => Status::DataSize,
            62 => Status::Crc,
            63 => Status::Checksum,
            70 => Status::PermissionDenied,
            71 => Status::ReadOnly,
            _ => return None,
        };
        Some(status)
    }

    /// Fixed English phrase for the code.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "Success",
            Status::InvalidParam => "Invalid parameter",
            Status::NullPointer => "Null reference",
            Status::NotSupported => "Operation not supported",
            Status::NotFound => "Not found",
            Status::InvalidSize => "Invalid size",
            Status::NotInitialized => "Not initialized",
            Status::AlreadyInitialized => "Already initialized",
            Status::InvalidState => "Invalid state",
            Status::Busy => "Busy",
            Status::Suspended => "Suspended",
            Status::NoMemory => "Out of memory",
            Status::NoResource => "No resource available",
            Status::ResourceBusy => "Resource busy",
            Status::Locked => "Resource locked",
            Status::Full => "Full",
            Status::Empty => "Empty",
            Status::Timeout => "Operation timed out",
            Status::WouldBlock => "Operation would block",
            Status::Io => "I/O error",
            Status::Overrun => "Overrun error",
            Status::Underrun => "Underrun error",
            Status::Parity => "Parity error",
            Status::Framing => "Framing error",
            Status::Noise => "Noise error",
            Status::Nack => "Not acknowledged",
            Status::Bus => "Bus error",
            Status::Arbitration => "Arbitration lost",
            Status::Dma => "DMA error",
            Status::NoData => "No data available",
            Status::DataSize => "Data size mismatch",
            Status::Crc => "CRC error",
            Status::Checksum => "Checksum error",
            Status::PermissionDenied => "Permission denied",
            Status::ReadOnly => "Read-only",
        }
    }

    /// All enumerated codes, in declaration order. Used by the string
    /// table tests and by diagnostic dumps.
    pub fn all() -> &'static [Status] {
        const ALL: [Status; 35] = [
            Status::Ok,
            Status::InvalidParam,
            Status::NullPointer,
            Status::NotSupported,
            Status::NotFound,
            Status::InvalidSize,
            Status::NotInitialized,
            Status::AlreadyInitialized,
            Status::InvalidState,
            Status::Busy,
            Status::Suspended,
            Status::NoMemory,
            Status::NoResource,
            Status::ResourceBusy,
            Status::Locked,
            Status::Full,
            Status::Empty,
            Status::Timeout,
            Status::WouldBlock,
            Status::Io,
            Status::Overrun,
            Status::Underrun,
            Status::Parity,
            Status::Framing,
            Status::Noise,
            Status::Nack,
            Status::Bus,
            Status::Arbitration,
            Status::Dma,
            Status::NoData,
            Status::DataSize,
            Status::Crc,
            Status::Checksum,
            Status::PermissionDenied,
            Status::ReadOnly,
        ];
        &ALL
    }

    /// Collapse a `Result<()>` back into a bare status.
    #[inline]
    pub fn from_result(result: Result<()>) -> Status {
        match result {
            Ok(()) => Status::Ok,
            Err(status) => status,
        }
    }
}

/// String for an arbitrary raw code; unknown values map to a fixed
/// fallback phrase.
pub fn code_to_str(code: u32) -> &'static str {
    match Status::from_code(code) {
        Some(status) => status.as_str(),
        None => "Unknown error",
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Status> for Result<()> {
    fn from(status: Status) -> Result<()> {
        if status.is_ok() {
            Ok(())
        } else {
            Err(status)
        }
    }
}
