use std::error::Error;

use am03127::{
    Brightness, Color, DeviceId, GraphicsBlock, GraphicsImage, GraphicsPage, PageId, ScheduleId, Sign,
};
use am03127_testing::VirtualSign;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // Create a virtual sign for testing purposes.
    // To control a real sign you would use SerialChannel instead.
    let id = DeviceId::try_new(1)?;
    let mut virtual_sign = VirtualSign::new(id);

    // Lose the first acknowledgement to show off the retries.
    virtual_sign.ignore_next(1);
    let mut sign = Sign::new(virtual_sign, id);

    sign.set_clock_now()?;
    sign.set_brightness(Brightness::try_new('B')?)?;

    // Two pages of scrolling text, shown in turn.
    sign.send_text("<L1><PA><FE><MA><WC><FE>Grüße aus Köln → 5 €")?;
    sign.send_text("<L1><PB><FI><MQ><WB><FJ>Page two ↑")?;
    sign.set_schedule(ScheduleId::try_new('A')?, "AB".parse()?)?;
    sign.set_default_run_page(PageId::try_new('A')?)?;

    // A diagonal rainbow stripe pattern.
    let mut image = GraphicsImage::new();
    for y in 0..am03127::core::HEIGHT {
        for x in 0..am03127::core::WIDTH {
            let color = match (x + y) % 4 {
                0 => Color::Red,
                1 => Color::Orange,
                2 => Color::Green,
                _ => Color::Black,
            };
            image.set_pixel(x, y, color);
        }
    }
    sign.set_graphics_block(GraphicsPage::try_new('A')?, GraphicsBlock::try_new(1)?, &image)?;

    // For testing purposes, print what the virtual sign ended up with.
    let virtual_sign = sign.into_inner();
    println!("Received {} frames", virtual_sign.frames().len());
    println!("Clock: {:?}", virtual_sign.clock());
    println!("Brightness: {:?}", virtual_sign.brightness());
    for ((line, page), text) in virtual_sign.pages() {
        println!("Line {} Page {}: {}", line, page, text);
    }
    for (schedule, entry) in virtual_sign.schedules() {
        println!("Schedule {}: pages {} from {} to {}", schedule, entry.pages, entry.start, entry.stop);
    }
    for ((page, block), image) in virtual_sign.graphics() {
        println!("Graphics {}{}:\n{}", page, block, image);
    }

    Ok(())
}
