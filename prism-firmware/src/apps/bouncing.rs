//! Bouncing balls
//!
//! Full-screen clear every frame (split across both cores) plus a handful
//! of filled circles; a reasonable stand-in for a game's frame budget.

use prism_core::{App, EngineError, Frame};

const BACKGROUND: u16 = 0x0010;
const COLORS: [u16; 4] = [0xFFE0, 0x07FF, 0xF81F, 0xFFFF];

/// Reference frame time the velocities are tuned for
const TICK_US: u32 = 16_667;

struct Ball {
    x: i32,
    y: i32,
    vx: i32,
    vy: i32,
    radius: i32,
    color: u16,
}

pub struct BouncingBalls {
    balls: [Ball; 4],
    width: i32,
    height: i32,
    /// Leftover time below one tick
    carry_us: u32,
}

impl BouncingBalls {
    pub fn new() -> Self {
        let mut n = 0;
        let balls = [(5, 4, 20), (-3, 6, 14), (4, -5, 10), (-6, -2, 24)].map(|(vx, vy, radius)| {
            let ball = Ball {
                x: 60 + n * 50,
                y: 60 + n * 30,
                vx,
                vy,
                radius,
                color: COLORS[n as usize],
            };
            n += 1;
            ball
        });
        Self {
            balls,
            width: 320,
            height: 240,
            carry_us: 0,
        }
    }

    fn step(&mut self) {
        for b in &mut self.balls {
            b.x += b.vx;
            b.y += b.vy;
            if b.x - b.radius <= 0 || b.x + b.radius >= self.width {
                b.vx = -b.vx;
                b.x = b.x.clamp(b.radius, self.width - b.radius);
            }
            if b.y - b.radius <= 0 || b.y + b.radius >= self.height {
                b.vy = -b.vy;
                b.y = b.y.clamp(b.radius, self.height - b.radius);
            }
        }
    }
}

impl App for BouncingBalls {
    fn name(&self) -> &'static str {
        "bouncing balls"
    }

    fn init(&mut self, width: u16, height: u16) {
        self.width = width as i32;
        self.height = height as i32;
    }

    fn update(&mut self, dt_us: u32) {
        // Fixed-step physics, at most four catch-up steps per frame
        self.carry_us = self.carry_us.saturating_add(dt_us);
        let mut steps = 0;
        while self.carry_us >= TICK_US && steps < 4 {
            self.step();
            self.carry_us -= TICK_US;
            steps += 1;
        }
        if steps == 4 {
            self.carry_us = 0;
        }
    }

    fn draw(&mut self, frame: &mut Frame<'_, '_>) -> Result<(), EngineError> {
        frame.clear(BACKGROUND)?;
        for b in &self.balls {
            frame.draw_circle(b.x, b.y, b.radius, b.color);
        }
        Ok(())
    }
}
