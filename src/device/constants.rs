/**
 * How often (milliseconds) to look at the discovered peripherals while scanning for the gamepad.
 */
pub const SCAN_POLL_DELAY: u64 = 250;

/**
 * Size of one gamepad report: i16 x axis, i16 y axis, i8 buttons, 1 byte padding.
 */
pub const SAMPLE_LEN: usize = 6;

/**
 * Full deflection of an axis. Maps to a third of the canvas dimension.
 */
pub const AXIS_MAX: f64 = 32767.0;

/**
 * The fraction of the canvas that a fully deflected axis moves the brush per sample. The canvas
 * represents a 3x3 meter working area.
 */
pub const AXIS_SPAN_DIVISOR: f64 = 3.0;

/**
 * Bit in the button byte that holds the trigger.
 */
pub const PAINT_BUTTON_MASK: i8 = 0x01;

/**
 * How long (milliseconds) unsubscribing from and disconnecting the gamepad may take on exit.
 */
pub const DISCONNECT_DEADLINE: u64 = 2000;
