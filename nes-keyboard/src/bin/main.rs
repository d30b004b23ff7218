#![no_std]
#![no_main]

use core::cell::RefCell;
use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Duration, Ticker};
use embassy_usb::driver::{Endpoint, EndpointOut};
use embassy_usb::{Builder, Config as UsbConfig, UsbDevice};
use nes_keyboard::{
    add_keyboard_interface, ControllerSampler, DeviceState, FramePacer, IdleCountdown,
    IndicatorPins, IndicatorSignal, Indicators, KeyboardBridge, KeyboardControl, LedSink, LedStatus, NesKeyboard,
    SharedKeys, SignalLeds, UsbDriver, UsbEndpointIn, UsbEndpointOut, UsbKeyboardOutput,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

type Keyboard = NesKeyboard<
    Output<'static>,
    Output<'static>,
    Input<'static>,
    Input<'static>,
    Delay,
    Input<'static>,
>;
type Keys = SharedKeys<'static, ThreadModeRawMutex, Keyboard>;

/// Idle rate, protocol mode and connection state.
static DEVICE_STATE: DeviceState = DeviceState::new();

/// Latest indicator pattern (latest value wins).
static INDICATORS: IndicatorSignal = Signal::new();

/// Scanned from the report task and from GET_REPORT, both in thread mode.
static KEYBOARD: StaticCell<Mutex<ThreadModeRawMutex, RefCell<Keyboard>>> = StaticCell::new();
static CONTROL: StaticCell<KeyboardControl<Keys, SignalLeds>> = StaticCell::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("NES keyboard starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Indicators ---
    let mut indicator_pins = IndicatorPins::new([
        Output::new(p.PIN_16, Level::Low),
        Output::new(p.PIN_17, Level::Low),
        Output::new(p.PIN_18, Level::Low),
        Output::new(p.PIN_19, Level::Low),
    ]);
    indicator_pins.set_indicators(Indicators::USB_NOT_READY);
    let leds = SignalLeds::new(&INDICATORS);

    // --- Controller bus ---
    let sampler = ControllerSampler::new(
        Output::new(p.PIN_2, Level::Low), // latch
        Output::new(p.PIN_3, Level::Low), // clock
        Input::new(p.PIN_4, Pull::Up),    // data A
        Input::new(p.PIN_5, Pull::Up),    // data B
        Delay,
    );
    let keyboard = NesKeyboard::new(sampler, Input::new(p.PIN_6, Pull::Up));
    let keys = SharedKeys::new(KEYBOARD.init(Mutex::new(RefCell::new(keyboard))));

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0002); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Rust Keyboard");
    usb_config.product = Some("NES Controller Keyboard");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    let interface = add_keyboard_interface(&mut builder);
    let control = CONTROL.init(KeyboardControl::new(
        interface.number,
        &DEVICE_STATE,
        keys.clone(),
        leds,
    ));
    builder.handler(control);

    // Build the USB device
    let usb_device = builder.build();

    let output = UsbKeyboardOutput::new(interface.ep_in, &DEVICE_STATE);
    let bridge = KeyboardBridge::new(keys, output, &DEVICE_STATE);

    // Spawn tasks (spawn returns Result in embassy-executor 0.9)
    spawner.spawn(usb_task(usb_device)).unwrap();
    spawner.spawn(indicator_task(indicator_pins, &INDICATORS)).unwrap();
    spawner.spawn(frame_task(DEVICE_STATE.idle().countdown())).unwrap();
    spawner.spawn(led_out_task(interface.ep_out, leds)).unwrap();
    spawner.spawn(report_task(bridge)).unwrap();

    info!("NES keyboard initialized, waiting for host...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) {
    device.run().await;
}

/// Report task - scans the controllers and sends reports once per frame.
#[embassy_executor::task]
async fn report_task(mut bridge: KeyboardBridge<'static, Keys, UsbKeyboardOutput<UsbEndpointIn>>) {
    bridge.output_mut().wait_ready().await;
    info!("Keyboard endpoint enabled, forwarding controllers...");

    bridge.run(FramePacer::new(Duration::from_millis(1))).await
}

/// Frame task - counts down the idle period.
#[embassy_executor::task]
async fn frame_task(countdown: &'static IdleCountdown) {
    let mut ticker = Ticker::every(Duration::from_millis(1));
    loop {
        ticker.next().await;
        countdown.tick();
    }
}

/// LED OUT task - applies LED reports sent on the interrupt OUT endpoint.
#[embassy_executor::task]
async fn led_out_task(mut ep: UsbEndpointOut, mut leds: SignalLeds) {
    let mut buf = [0u8; 8];
    loop {
        ep.wait_enabled().await;
        match ep.read(&mut buf).await {
            Ok(0) => {}
            Ok(_) => leds.apply_led_report(LedStatus(buf[0])),
            Err(e) => warn!("LED endpoint error: {:?}", e),
        }
    }
}

/// Indicator task - drives the LED pins with the latest pattern.
#[embassy_executor::task]
async fn indicator_task(mut pins: IndicatorPins, signal: &'static IndicatorSignal) {
    loop {
        let indicators = signal.wait().await;
        pins.set_indicators(indicators);
    }
}
