//! GPIO / peripheral pin assignments for the CoopDoor motor board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Door motor driver (BTS7960 dual half-bridge)
// ---------------------------------------------------------------------------

/// LEDC PWM output: IN1 — duty for the OPEN direction.
pub const MOTOR_IN1_GPIO: i32 = 14;
/// LEDC PWM output: IN2 — duty for the CLOSE direction.
pub const MOTOR_IN2_GPIO: i32 = 15;
/// Digital output: left half-bridge enable (active HIGH).
pub const MOTOR_L_EN_GPIO: i32 = 16;
/// Digital output: right half-bridge enable (active HIGH).
pub const MOTOR_R_EN_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// I²C bus (INA219 current monitor)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 1;
pub const I2C_SCL_GPIO: i32 = 2;

/// INA219 7-bit bus address (A0/A1 strapped low).
pub const INA219_ADDR: u8 = 0x40;

// ---------------------------------------------------------------------------
// Command link UART (to the network node)
// ---------------------------------------------------------------------------

pub const LINK_UART_TX_GPIO: i32 = 8;
pub const LINK_UART_RX_GPIO: i32 = 9;
/// Half-duplex link rate shared with the network node.
pub const LINK_UART_BAUD: u32 = 38_400;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  10-bit gives 0 – 1023 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 10;
/// LEDC base frequency for the door motor (1 kHz, BTS7960-compatible).
pub const MOTOR_PWM_FREQ_HZ: u32 = 1_000;
