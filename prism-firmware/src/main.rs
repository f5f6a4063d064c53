//! Prism - dual-core framebuffer presentation on the RP2040
//!
//! Core 0 runs the application and the swap chain; core 1 runs the
//! render worker that takes half of every clear. Finished frames stream
//! to the panel over PIO + DMA while the next one is drawn.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::dma::AnyChannel;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::Pio;
use embassy_time::Delay;
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use prism_core::render::run_worker;
use prism_core::{
    App, DisplayController, Engine, PanelConfig, RenderLink, RenderService, SwapChain,
};
use prism_hal_rp2040::{DmaFill, EmbassyClock, GpioOut, PioTransport};

use crate::board::{CORE1_STACK_SIZE, HEAP_SIZE};

mod apps;
mod board;

#[global_allocator]
static HEAP: Heap = Heap::empty();

/// Rendezvous between the two cores
static RENDER_LINK: RenderLink = RenderLink::new();

static CORE1_STACK: StaticCell<Stack<CORE1_STACK_SIZE>> = StaticCell::new();

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Prism starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    let config = board::engine_config();
    let clocks = config.clocks();

    spawn_core1(p.CORE1, CORE1_STACK.init(Stack::new()), move || {
        run_worker(&RENDER_LINK, &EmbassyClock);
        loop {
            cortex_m::asm::wfe();
        }
    });
    info!("Render worker started on core 1");

    // Panel link on PIO0 SM0
    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);
    let link = PioTransport::new(
        &mut common,
        sm0,
        p.PIN_18,
        p.PIN_19,
        p.PIN_17,
        p.PIN_21,
        p.DMA_CH0.into::<AnyChannel>(),
    );

    let mut panel = DisplayController::new(
        link,
        GpioOut(Output::new(p.PIN_20, Level::High)),
        GpioOut(Output::new(p.PIN_22, Level::Low)),
        PanelConfig::new(config.width, config.height, config.pixel_format),
    );
    if let Err(e) = panel.init(&mut Delay, &clocks) {
        error!("Panel init failed: {}", e);
        return;
    }
    info!(
        "Panel ready: {}x{} {}",
        config.width,
        config.height,
        config.pixel_format.name()
    );

    let chain = match SwapChain::new(panel, EmbassyClock, &config) {
        Ok(chain) => chain,
        Err(e) => {
            error!("Swap chain setup failed: {}", e);
            return;
        }
    };

    let fill = DmaFill::new(p.DMA_CH1.into::<AnyChannel>());
    let mut engine = Engine::new(
        chain,
        Some(RenderService::new(&RENDER_LINK)),
        fill,
        clk_sys_freq(),
    );

    let mut app = apps::BouncingBalls::new();
    info!("Starting application: {}", app.name());
    engine.start(&mut app);

    loop {
        match engine.frame(&mut app) {
            Ok(Some(stats)) => info!(
                "{} fps | core0 {}% | core1 {}% | cpu {} Hz | link {} Hz | {}x{} {}",
                stats.fps,
                stats.core0_usage_pct,
                stats.core1_usage_pct,
                stats.cpu_hz,
                stats.link_hz,
                stats.width,
                stats.height,
                stats.format.name()
            ),
            Ok(None) => {}
            Err(e) => error!("Frame failed: {}", e),
        }
    }
}

fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}
