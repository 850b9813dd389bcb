// Magic Wand - Reference Gesture Traces
//
// Recorded wand motions in model units (m/s^2 x 100), one row per 25 Hz
// sample. Each trace is a full 128-sample window: the wand is at rest
// (all zeros, the recorder's lead-in) until the motion starts.

use crate::config::WINDOW_SAMPLES;

pub type Trace = [[f32; 3]; WINDOW_SAMPLES];

/// Right-align `motion` in a window, padding the front with rest samples.
const fn at_rest<const N: usize>(motion: [[f32; 3]; N]) -> Trace {
    let mut window = [[0.0f32; 3]; WINDOW_SAMPLES];
    let lead = WINDOW_SAMPLES - N;
    let mut i = 0;
    while i < N {
        window[lead + i] = motion[i];
        i += 1;
    }
    window
}

pub const RING_TRACE: Trace = at_rest([
    [-665.0, 228.0, 827.0],
    [-680.0, 339.0, 716.0],
    [-680.0, 564.0, 812.0],
    [-679.0, 552.0, 818.0],
    [-665.0, 528.0, 751.0],
    [-658.0, 432.0, 618.0],
    [-655.0, 445.0, 592.0],
    [-667.0, 484.0, 556.0],
    [-684.0, 590.0, 510.0],
    [-674.0, 672.0, 475.0],
    [-660.0, 786.0, 390.0],
    [-562.0, 1124.0, 128.0],
    [-526.0, 1140.0, 111.0],
    [-486.0, 1044.0, 33.0],
    [-416.0, 652.0, -134.0],
    [-390.0, 534.0, -143.0],
    [-365.0, 381.0, -117.0],
    [-314.0, 60.0, 94.0],
    [-322.0, 7.0, 190.0],
    [-338.0, -95.0, 342.0],
    [-360.0, -106.0, 842.0],
    [-351.0, -41.0, 965.0],
    [-352.0, 12.0, 960.0],
    [-366.0, 42.0, 1124.0],
    [-322.0, 56.0, 1178.0],
    [-312.0, 15.0, 1338.0],
    [-254.0, 10.0, 1532.0],
    [-241.0, 5.0, 1590.0],
    [-227.0, 60.0, 1565.0],
    [-204.0, 282.0, 1560.0],
    [-180.0, 262.0, 1524.0],
    [-138.0, 385.0, 1522.0],
    [-84.0, 596.0, 1626.0],
    [-55.0, 639.0, 1604.0],
    [-19.0, 771.0, 1511.0],
    [16.0, 932.0, 1132.0],
    [15.0, 924.0, 1013.0],
    [1.0, 849.0, 812.0],
    [-88.0, 628.0, 500.0],
    [-114.0, 609.0, 463.0],
    [-155.0, 559.0, 382.0],
    [-234.0, 420.0, 278.0],
    [-254.0, 390.0, 272.0],
    [-327.0, 200.0, 336.0],
    [-558.0, -556.0, 630.0],
    [-640.0, -607.0, 740.0],
    [-706.0, -430.0, 868.0],
    [-778.0, 42.0, 1042.0],
    [-763.0, 84.0, 973.0],
    [-735.0, 185.0, 931.0],
    [-682.0, 252.0, 766.0],
    [-673.0, 230.0, 757.0],
    [-671.0, 218.0, 757.0],
    [-656.0, 222.0, 714.0],
    [-659.0, 238.0, 746.0],
    [-640.0, 276.0, 731.0],
    [-634.0, 214.0, 754.0],
    [-637.0, 207.0, 735.0],
    [-637.0, 194.0, 742.0],
    [-634.0, 248.0, 716.0],
    [-631.0, 265.0, 697.0],
    [-628.0, 252.0, 797.0],
    [-592.0, 204.0, 816.0],
    [-618.0, 218.0, 812.0],
    [-633.0, 231.0, 828.0],
    [-640.0, 222.0, 736.0],
    [-634.0, 221.0, 787.0],
]);

pub const SLOPE_TRACE: Trace = at_rest([
    [-766.0, 132.0, 709.0],
    [-751.0, 249.0, 659.0],
    [-714.0, 314.0, 630.0],
    [-709.0, 244.0, 623.0],
    [-707.0, 230.0, 659.0],
    [-704.0, 202.0, 748.0],
    [-714.0, 219.0, 728.0],
    [-722.0, 239.0, 710.0],
    [-744.0, 116.0, 612.0],
    [-753.0, -49.0, 570.0],
    [-748.0, -279.0, 527.0],
    [-668.0, -664.0, 592.0],
    [-601.0, -635.0, 609.0],
    [-509.0, -559.0, 606.0],
    [-286.0, -162.0, 536.0],
    [-255.0, -144.0, 495.0],
    [-209.0, -85.0, 495.0],
    [6.0, 416.0, 698.0],
    [-33.0, 304.0, 1117.0],
    [-82.0, 405.0, 1480.0],
    [-198.0, 1008.0, 1908.0],
    [-229.0, 990.0, 1743.0],
    [-234.0, 934.0, 1453.0],
    [-126.0, 838.0, 896.0],
    [-78.0, 792.0, 911.0],
    [-27.0, 741.0, 918.0],
    [114.0, 734.0, 960.0],
    [135.0, 613.0, 959.0],
    [152.0, 426.0, 1015.0],
    [106.0, -116.0, 1110.0],
    [63.0, -314.0, 1129.0],
    [-12.0, -486.0, 1179.0],
    [-118.0, -656.0, 1510.0],
    [-116.0, -558.0, 1553.0],
    [-126.0, -361.0, 1367.0],
    [-222.0, -76.0, 922.0],
    [-210.0, -26.0, 971.0],
    [-194.0, 50.0, 1053.0],
    [-178.0, 72.0, 1082.0],
    [-169.0, 100.0, 1073.0],
    [-162.0, 133.0, 1050.0],
    [-156.0, 226.0, 976.0],
    [-154.0, 323.0, 886.0],
    [-130.0, 240.0, 1154.0],
    [-116.0, 124.0, 916.0],
    [-132.0, 124.0, 937.0],
    [-153.0, 115.0, 981.0],
    [-184.0, 94.0, 962.0],
    [-177.0, 85.0, 1017.0],
    [-173.0, 92.0, 1027.0],
    [-168.0, 158.0, 1110.0],
    [-181.0, 101.0, 1030.0],
    [-180.0, 139.0, 1054.0],
    [-152.0, 10.0, 1044.0],
    [-169.0, 74.0, 1007.0],
]);
